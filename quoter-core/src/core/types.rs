//! Zero-overhead core types shared by the feed, quote and lifecycle modules
//!
//! All types in this module are designed for:
//! - Zero heap allocations
//! - Copy semantics (they cross the hot path by value)
//! - Minimal memory footprint

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque order identity assigned by the order sink at Add time
///
/// Uses u64 instead of a venue string key so it can live in an `AtomicU64`
/// next to the live flags. Zero is reserved for "no order".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OrderKey(pub u64);

impl OrderKey {
    /// Sentinel for "no resting order"
    pub const NONE: OrderKey = OrderKey(0);

    #[inline(always)]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for OrderKey {
    #[inline(always)]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Order side (Buy or Sell)
///
/// Single byte enum for minimal size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Buy, Side::Sell];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Time-in-force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled (default)
    #[default]
    GTC,
    /// Good for the trading day
    Day,
    /// Immediate-or-cancel
    IOC,
}

/// What the order sink should do with an order descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderAction {
    /// Submit a new resting order; the sink assigns its `OrderKey`
    Add = 0,
    /// Modify the limit price of a resting order
    Change = 1,
    /// Cancel a resting order
    Delete = 2,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Add => write!(f, "ADD"),
            OrderAction::Change => write!(f, "CHANGE"),
            OrderAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// Price expressed as an integer number of ticks
///
/// Prices on the hot path are compared on the tick grid, never as raw
/// floats, so two computations landing on the same tick always compare
/// equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Ticks(pub i64);

impl Ticks {
    /// Snap a tick-aligned f64 price onto the integer grid
    #[inline(always)]
    pub fn from_price(price: f64, tick_size: f64) -> Self {
        Ticks((price / tick_size).round() as i64)
    }

    /// Exact decimal price for this tick count
    #[inline(always)]
    pub fn to_decimal(self, tick_size: Decimal) -> Decimal {
        Decimal::from(self.0) * tick_size
    }

    #[inline(always)]
    pub fn to_f64(self, tick_size: f64) -> f64 {
        self.0 as f64 * tick_size
    }
}

/// A single order action sent to the order sink
///
/// Copy-only, so building one on the hot path never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub action: OrderAction,
    /// Identity of the resting order (`OrderKey::NONE` for Add)
    pub key: OrderKey,
    pub side: Side,
    pub limit_price: Decimal,
    pub quantity: Decimal,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// New limit order
    #[inline]
    pub fn add(side: Side, limit_price: Decimal, quantity: Decimal, tif: TimeInForce) -> Self {
        Self {
            action: OrderAction::Add,
            key: OrderKey::NONE,
            side,
            limit_price,
            quantity,
            time_in_force: tif,
        }
    }

    /// Same order, new price
    #[inline]
    pub fn change(self, key: OrderKey, limit_price: Decimal) -> Self {
        Self {
            action: OrderAction::Change,
            key,
            limit_price,
            ..self
        }
    }

    /// Same order, cancelled
    #[inline]
    pub fn delete(self, key: OrderKey) -> Self {
        Self {
            action: OrderAction::Delete,
            key,
            ..self
        }
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} (key={})",
            self.action, self.side, self.quantity, self.limit_price, self.key
        )
    }
}
