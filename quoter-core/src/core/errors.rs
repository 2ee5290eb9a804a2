//! Domain-specific error types for the quoting core
//!
//! Every fallible operation in the library returns one of these. Anything
//! surfacing from an event handler is fatal: the controller routes it to
//! the unconditional shutdown transition instead of retrying.

use crate::core::types::OrderKey;
use rust_decimal::Decimal;
use std::io;
use thiserror::Error;

/// Errors from the feed subprocess and its read loop
#[derive(Debug, Error)]
pub enum FeedError {
    /// The external feed process could not be started
    #[error("failed to spawn feed process `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process was started without a captured stdout/stderr pipe
    #[error("feed process has no {stream} pipe")]
    MissingPipe { stream: &'static str },

    /// The reader thread could not be created
    #[error("failed to start feed reader thread: {0}")]
    Thread(#[source] io::Error),

    /// Termination signal could not be delivered
    #[error("failed to signal feed process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

/// Errors raised by an order sink when an action cannot be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink session has been released
    #[error("order sink is closed")]
    Closed,

    /// Change/Delete for an identity the sink never assigned
    #[error("unknown order {0}")]
    UnknownOrder(OrderKey),

    /// The venue refused the action
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors while the lifecycle controller handles an event
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The order sink refused an action mid-sequence
    #[error("order sink failure during {stage}: {source}")]
    Sink {
        stage: &'static str,
        #[source]
        source: SinkError,
    },

    /// Start was requested before any reference price arrived
    #[error("no reference price available")]
    NoReferencePrice,

    /// Start or warmup was requested before the instrument was configured
    #[error("instrument tick size not configured")]
    NoInstrument,

    /// Start carried a quote grid other than the instrument's
    #[error("quote tick size {quote} does not match instrument tick size {instrument}")]
    TickSizeMismatch { instrument: Decimal, quote: Decimal },

    /// The decimal quote path could not represent the price
    #[error("reference price {price} is not representable as a decimal")]
    UnrepresentablePrice { price: f64 },
}

/// Top-level error for the quoting core
#[derive(Debug, Error)]
pub enum QuoterError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
