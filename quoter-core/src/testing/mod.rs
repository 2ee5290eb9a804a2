//! Test doubles and helpers
//!
//! - `RecordingOrderSink`: order sink that records every action and assigns
//!   sequential keys; failures can be injected
//! - `RecordingListener`: price listener that records what the feed forwarded
//! - helpers for feed lines and driving a controller through warmup

pub mod helpers;
pub mod mock_sink;

pub use helpers::*;
pub use mock_sink::RecordingOrderSink;
