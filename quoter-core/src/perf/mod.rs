//! Performance Utilities
//!
//! - **CPU affinity**: pin the feed reader thread to a fixed core
//! - **Realtime priority**: optional SCHED_FIFO hint for the process
//! - **Lock-free metrics**: cache-aligned atomic counters for the hot path

pub mod cpu;
pub mod metrics;

// Re-exports for convenience
pub use cpu::{num_cores, set_realtime_priority, AffinityPinner};
pub use metrics::{MetricsSnapshot, QuoteMetrics};
