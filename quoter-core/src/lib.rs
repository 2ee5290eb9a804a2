//! Quoter Core - two-sided quoting around a streamed reference price
//!
//! Ingests prices from an external feed process, turns each one into
//! tick-aligned buy/sell limits, and drives the resting orders through a
//! warmup-then-quote lifecycle.
//!
//! ## Architecture
//! - **No locks, no allocation** on the per-price hot path
//! - **Cache-line aligned** shared state (64 bytes)
//! - **Atomic snapshot** publication of the quote configuration
//! - **One state machine** for every control decision
//!
//! ## Data Flow
//! ```text
//! feed stdout ─► LineAssembler ─► FieldExtractor ─► FeedIngester
//!                                                      │ latest price per read
//!                                                      ▼
//!                        OrderLifecycleController ─► QuoteEngine ─► OrderSink
//! ```
//!
//! ## Core Modules
//! - `core`: shared types (`OrderKey`, `OrderRequest`, `Ticks`) and errors
//! - `feed`: line reassembly, price extraction, feed process ingester
//! - `quote`: quote configuration, rounding engine, resting quote state
//! - `lifecycle`: the order lifecycle state machine
//! - `execution`: order sink abstraction and the paper venue

pub mod config;
pub mod core;
pub mod execution;
pub mod feed;
pub mod lifecycle;
pub mod perf;
pub mod quote;
pub mod resilience;
pub mod testing;
pub mod utils;

pub use crate::core::{
    ConfigError, FeedError, LifecycleError, OrderAction, OrderKey, OrderRequest, QuoterError,
    Side, SinkError, Ticks, TimeInForce,
};
pub use config::AppConfig;
pub use execution::{OrderEvent, OrderSink, SimulatedOrderSink};
pub use feed::{FeedIngester, PriceListener};
pub use lifecycle::{
    LifecycleEvent, LifecycleState, Notification, OrderLifecycleController, StopReason,
};
pub use quote::{QuoteConfig, QuoteEngine};

pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::core::{OrderKey, OrderRequest, Side, Ticks};
    pub use crate::execution::{OrderEvent, OrderSink, SimulatedMarketData, SimulatedOrderSink};
    pub use crate::feed::{FeedIngester, PriceListener};
    pub use crate::lifecycle::{
        ControllerSettings, LifecycleEvent, LifecycleState, Notification, Notifier,
        OrderLifecycleController, StopReason,
    };
    pub use crate::perf::AffinityPinner;
    pub use crate::quote::{QuoteConfig, QuoteEngine};
    pub use crate::{Error, Result};
}
