//! Lock-Free Quote Metrics
//!
//! Cache-aligned atomic counters updated from the feed reader thread and
//! read from anywhere. All counters use relaxed ordering.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-aligned counters for the quoting pipeline
///
/// Each counter sits on its own cache line so the reader thread never
/// contends with observers.
#[repr(C, align(64))]
pub struct QuoteMetrics {
    /// Prices delivered to the hot path
    pub prices_received: AtomicU64,

    /// Padding to next cache line
    _padding1: [u8; 56],

    /// Prices that ran the quote computation (both sides live)
    pub quote_refreshes: AtomicU64,

    /// Padding to next cache line
    _padding2: [u8; 56],

    /// Change actions sent to the order sink
    pub changes_sent: AtomicU64,

    /// Padding to next cache line
    _padding3: [u8; 56],

    /// Side refreshes skipped because the price was unchanged
    pub changes_suppressed: AtomicU64,

    /// Padding to next cache line
    _padding4: [u8; 56],

    /// Fills observed while quoting
    pub fills_received: AtomicU64,

    /// Padding to next cache line
    _padding5: [u8; 56],
}

impl QuoteMetrics {
    pub const fn new() -> Self {
        Self {
            prices_received: AtomicU64::new(0),
            _padding1: [0; 56],
            quote_refreshes: AtomicU64::new(0),
            _padding2: [0; 56],
            changes_sent: AtomicU64::new(0),
            _padding3: [0; 56],
            changes_suppressed: AtomicU64::new(0),
            _padding4: [0; 56],
            fills_received: AtomicU64::new(0),
            _padding5: [0; 56],
        }
    }

    #[inline(always)]
    pub fn inc_prices(&self) {
        self.prices_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_refreshes(&self) {
        self.quote_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_changes(&self) {
        self.changes_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_suppressed(&self) {
        self.changes_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_fills(&self) {
        self.fills_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            prices_received: self.prices_received.load(Ordering::Relaxed),
            quote_refreshes: self.quote_refreshes.load(Ordering::Relaxed),
            changes_sent: self.changes_sent.load(Ordering::Relaxed),
            changes_suppressed: self.changes_suppressed.load(Ordering::Relaxed),
            fills_received: self.fills_received.load(Ordering::Relaxed),
        }
    }
}

impl Default for QuoteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub prices_received: u64,
    pub quote_refreshes: u64,
    pub changes_sent: u64,
    pub changes_suppressed: u64,
    pub fills_received: u64,
}

impl MetricsSnapshot {
    /// Fraction of side refreshes that resulted in an order change
    pub fn change_rate(&self) -> f64 {
        let total = self.changes_sent + self.changes_suppressed;
        if total == 0 {
            0.0
        } else {
            self.changes_sent as f64 / total as f64
        }
    }
}
