//! Quote computation and resting quote state
//!
//! - `config`: immutable `QuoteConfig` and its f64 hot-path snapshot
//! - `engine`: floor/ceil rounding onto the tick grid, f64 and decimal paths
//! - `pair`: lock-free buy/sell resting order state with the no-churn rule

pub mod config;
pub mod engine;
pub mod pair;

mod engine_proptest;

pub use config::{HotQuoteConfig, QuoteConfig};
pub use engine::{QuoteEngine, QuotePrices, FLOAT_EPSILON};
pub use pair::{QuotePair, QuotePairView, QuoteSide, Reprice};
