//! Quote parameters and their hot-path snapshot

use crate::core::ConfigError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Offset and width of the two-sided quote
///
/// Immutable once built. The f64 cache is derived in the constructor and
/// cannot drift from the decimal fields, because nothing can change them
/// afterwards: a new configuration is a new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteConfig {
    offset: Decimal,
    tick_count: u32,
    tick_size: Decimal,
    hot: HotQuoteConfig,
}

impl QuoteConfig {
    /// Validate and build
    ///
    /// `tick_count` must be at least 1 and `tick_size` strictly positive.
    pub fn new(offset: Decimal, tick_count: u32, tick_size: Decimal) -> Result<Self, ConfigError> {
        if tick_count < 1 {
            return Err(ConfigError::Invalid {
                field: "tick_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if tick_size <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "tick_size",
                reason: format!("must be positive, got {}", tick_size),
            });
        }

        let hot = HotQuoteConfig {
            offset: to_f64(offset, "offset")?,
            tick_count: tick_count as f64,
            tick_size: to_f64(tick_size, "tick_size")?,
            tick_size_exact: tick_size,
        };

        Ok(Self {
            offset,
            tick_count,
            tick_size,
            hot,
        })
    }

    pub fn offset(&self) -> Decimal {
        self.offset
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    /// Distance from mid to each raw quote: `tick_count * tick_size`
    pub fn half_width(&self) -> Decimal {
        Decimal::from(self.tick_count) * self.tick_size
    }

    /// The f64 view used on the hot path
    #[inline(always)]
    pub fn hot(&self) -> HotQuoteConfig {
        self.hot
    }
}

/// Plain-old-data snapshot read by the feed thread on every refresh
///
/// Published as one value through `OrderLifecycleController`'s
/// `hot: AtomicCell<HotQuoteConfig>`, never field by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotQuoteConfig {
    pub offset: f64,
    pub tick_count: f64,
    pub tick_size: f64,
    /// Exact tick size for converting tick counts back to order prices
    pub tick_size_exact: Decimal,
}

impl HotQuoteConfig {
    /// Placeholder before the first start; never used for quoting
    pub const UNSET: HotQuoteConfig = HotQuoteConfig {
        offset: 0.0,
        tick_count: 0.0,
        tick_size: 0.0,
        tick_size_exact: Decimal::ZERO,
    };

    pub fn is_set(&self) -> bool {
        self.tick_size > 0.0 && self.tick_count >= 1.0
    }
}

impl Default for HotQuoteConfig {
    fn default() -> Self {
        Self::UNSET
    }
}

fn to_f64(value: Decimal, field: &'static str) -> Result<f64, ConfigError> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::Invalid {
            field,
            reason: format!("{} is not representable as f64", value),
        })
}
