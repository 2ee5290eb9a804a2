//! Core zero-overhead types for the quoting pipeline
//!
//! This module provides the fundamental building blocks shared by the feed,
//! quote engine and lifecycle controller:
//! - `OrderKey`: u64 order identity (fits in an atomic)
//! - `OrderRequest`: Copy order action for the order sink
//! - `Ticks`: integer price on the tick grid
//! - Error types for every layer

pub mod errors;
pub mod types;

// Re-export commonly used types
pub use errors::{ConfigError, FeedError, LifecycleError, QuoterError, SinkError};
pub use types::{OrderAction, OrderKey, OrderRequest, Side, Ticks, TimeInForce};
