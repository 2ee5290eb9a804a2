//! Quote Engine - reference price to tick-aligned buy/sell limits
//!
//! ```text
//! mid      = offset + reference
//! raw_buy  = mid - tick_count * tick_size
//! raw_sell = mid + tick_count * tick_size
//! buy      = floor(raw_buy  / tick_size + ε) * tick_size
//! sell     = ceil (raw_sell / tick_size - ε) * tick_size
//! ```
//!
//! Buy rounds toward -∞ and sell toward +∞, so rounding only ever widens
//! the spread. ε only exists on the f64 path, where a value sitting exactly
//! on a tick can come out of the division a hair below or above it. The
//! decimal path is exact and uses no ε.
//!
//! Both paths are pure: same inputs, same outputs, no hidden state.

use super::config::{HotQuoteConfig, QuoteConfig};
use crate::core::Ticks;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Tolerance for binary representation error on tick boundaries
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Buy and sell limit for one reference price
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub struct QuotePrices<T> {
    pub buy: T,
    pub sell: T,
}

/// Zero-sized quote calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteEngine;

impl QuoteEngine {
    /// Hot path: f64 prices on the tick grid
    #[inline(always)]
    pub fn hot(reference: f64, cfg: &HotQuoteConfig) -> QuotePrices<f64> {
        let ticks = Self::hot_ticks(reference, cfg);
        QuotePrices {
            buy: ticks.buy.to_f64(cfg.tick_size),
            sell: ticks.sell.to_f64(cfg.tick_size),
        }
    }

    /// Hot path: integer tick counts
    ///
    /// This is what the controller compares against the resting orders.
    #[inline(always)]
    pub fn hot_ticks(reference: f64, cfg: &HotQuoteConfig) -> QuotePrices<Ticks> {
        let t = cfg.tick_size;
        let mid = cfg.offset + reference;
        let width = cfg.tick_count * t;

        let buy = ((mid - width) / t + FLOAT_EPSILON).floor();
        let sell = ((mid + width) / t - FLOAT_EPSILON).ceil();

        QuotePrices {
            buy: Ticks(buy as i64),
            sell: Ticks(sell as i64),
        }
    }

    /// Start path: exact decimal prices on the tick grid
    pub fn exact(reference: Decimal, cfg: &QuoteConfig) -> QuotePrices<Decimal> {
        let t = cfg.tick_size();
        let mid = cfg.offset() + reference;
        let width = cfg.half_width();

        QuotePrices {
            buy: ((mid - width) / t).floor() * t,
            sell: ((mid + width) / t).ceil() * t,
        }
    }

    /// Start path: integer tick counts
    ///
    /// `None` only if the tick count does not fit in an i64.
    pub fn exact_ticks(reference: Decimal, cfg: &QuoteConfig) -> Option<QuotePrices<Ticks>> {
        let t = cfg.tick_size();
        let prices = Self::exact(reference, cfg);
        Some(QuotePrices {
            buy: Ticks((prices.buy / t).to_i64()?),
            sell: Ticks((prices.sell / t).to_i64()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn cfg(offset: Decimal, ticks: u32, tick_size: Decimal) -> QuoteConfig {
        QuoteConfig::new(offset, ticks, tick_size).unwrap()
    }

    #[test]
    fn test_quarter_tick_scenario() {
        let c = cfg(dec!(0), 4, dec!(0.25));

        let exact = QuoteEngine::exact(dec!(100.00), &c);
        assert_eq!(exact.buy, dec!(99.00));
        assert_eq!(exact.sell, dec!(101.00));

        let hot = QuoteEngine::hot(100.0, &c.hot());
        assert_relative_eq!(hot.buy, 99.0);
        assert_relative_eq!(hot.sell, 101.0);

        let ticks = QuoteEngine::hot_ticks(100.0, &c.hot());
        assert_eq!(ticks.buy, Ticks(396));
        assert_eq!(ticks.sell, Ticks(404));
    }

    #[test]
    fn test_off_grid_reference_widens() {
        // mid 100.10 -> raw 99.10 / 101.10 -> 99.00 / 101.25
        let c = cfg(dec!(0), 4, dec!(0.25));
        let exact = QuoteEngine::exact(dec!(100.10), &c);
        assert_eq!(exact.buy, dec!(99.00));
        assert_eq!(exact.sell, dec!(101.25));

        let ticks = QuoteEngine::hot_ticks(100.10, &c.hot());
        assert_eq!(ticks.buy, Ticks(396));
        assert_eq!(ticks.sell, Ticks(405));
    }

    #[test]
    fn test_offset_shifts_mid() {
        let c = cfg(dec!(-0.0050), 2, dec!(0.0001));
        let exact = QuoteEngine::exact(dec!(1.08455), &c);
        // mid 1.07955 -> raw 1.07935 / 1.07975 -> 1.0793 / 1.0798
        assert_eq!(exact.buy, dec!(1.0793));
        assert_eq!(exact.sell, dec!(1.0798));

        let ticks = QuoteEngine::hot_ticks(1.08455, &c.hot());
        assert_eq!(ticks.buy, Ticks(10793));
        assert_eq!(ticks.sell, Ticks(10798));
    }

    #[test]
    fn test_epsilon_keeps_boundary_values_on_tick() {
        // 0.3 / 0.1 is 2.9999999999999996 in f64; without ε buy would drop a tick
        let c = cfg(dec!(0.2), 1, dec!(0.1));
        let ticks = QuoteEngine::hot_ticks(0.2, &c.hot());
        // mid 0.4, raw buy 0.3, raw sell 0.5
        assert_eq!(ticks.buy, Ticks(3));
        assert_eq!(ticks.sell, Ticks(5));

        let exact = QuoteEngine::exact_ticks(dec!(0.2), &c).unwrap();
        assert_eq!(exact, ticks);
    }

    #[test]
    fn test_negative_mid() {
        let c = cfg(dec!(-200), 1, dec!(0.5));
        let exact = QuoteEngine::exact(dec!(100.2), &c);
        // mid -99.8 -> raw -100.3 / -99.3 -> -100.5 / -99.0
        assert_eq!(exact.buy, dec!(-100.5));
        assert_eq!(exact.sell, dec!(-99.0));
        assert_eq!(
            QuoteEngine::hot_ticks(100.2, &c.hot()),
            QuoteEngine::exact_ticks(dec!(100.2), &c).unwrap()
        );
    }

    #[test]
    fn test_pure_function() {
        let c = cfg(dec!(0.5), 3, dec!(0.01)).hot();
        assert_eq!(QuoteEngine::hot(123.456, &c), QuoteEngine::hot(123.456, &c));
    }
}
