//! Recording order sink for testing
//!
//! Acknowledgments are not generated: tests deliver `OrderAdded` and friends
//! to the controller themselves, in whatever order the scenario needs.

use crate::core::{OrderAction, OrderKey, OrderRequest, SinkError};
use crate::execution::OrderSink;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    sent: Mutex<Vec<(OrderRequest, OrderKey)>>,
    next_key: AtomicU64,
    fail_next: Mutex<Option<SinkError>>,
    closed: AtomicBool,
}

/// Cloneable handle; clones share the same record
#[derive(Clone, Default)]
pub struct RecordingOrderSink {
    inner: Arc<Inner>,
}

impl RecordingOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted requests, oldest first
    pub fn requests(&self) -> Vec<OrderRequest> {
        self.inner.sent.lock().iter().map(|(r, _)| *r).collect()
    }

    /// Accepted requests with the key each one resolved to
    pub fn sent(&self) -> Vec<(OrderRequest, OrderKey)> {
        self.inner.sent.lock().clone()
    }

    pub fn count(&self, action: OrderAction) -> usize {
        self.inner
            .sent
            .lock()
            .iter()
            .filter(|(r, _)| r.action == action)
            .count()
    }

    /// Key of the most recent accepted request
    pub fn last_key(&self) -> Option<OrderKey> {
        self.inner.sent.lock().last().map(|(_, k)| *k)
    }

    /// Forget everything recorded so far (keys keep counting)
    pub fn clear(&self) {
        self.inner.sent.lock().clear();
    }

    /// Make the next submit fail with `err`
    pub fn fail_next(&self, err: SinkError) {
        *self.inner.fail_next.lock() = Some(err);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl OrderSink for RecordingOrderSink {
    fn submit(&self, request: &OrderRequest) -> Result<OrderKey, SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        if let Some(err) = self.inner.fail_next.lock().take() {
            return Err(err);
        }

        let key = match request.action {
            OrderAction::Add => OrderKey(self.inner.next_key.fetch_add(1, Ordering::Relaxed) + 1),
            OrderAction::Change | OrderAction::Delete => request.key,
        };
        self.inner.sent.lock().push((*request, key));
        Ok(key)
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
