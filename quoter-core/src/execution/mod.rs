//! Order sink abstraction
//!
//! The venue session is an external collaborator. The core hands it
//! `OrderRequest`s and receives `OrderEvent`s back asynchronously, keyed by
//! the `OrderKey` the sink assigned at Add time.
//!
//! Implementations: `SimulatedOrderSink` (paper venue) and
//! `testing::RecordingOrderSink` (test double).

pub mod simulated;

pub use simulated::{SimulatedMarketData, SimulatedOrderSink};

use crate::core::{OrderAction, OrderKey, OrderRequest, Side, SinkError};
use crate::lifecycle::LifecycleEvent;
use rust_decimal::Decimal;

/// Accepts order actions for the venue
///
/// `submit` must not call back into the controller synchronously;
/// acknowledgments are delivered later as `OrderEvent`s.
pub trait OrderSink: Send + Sync + 'static {
    /// Send one action
    ///
    /// For `Add` the returned key is the new order's identity. For `Change`
    /// and `Delete` it echoes `request.key`.
    fn submit(&self, request: &OrderRequest) -> Result<OrderKey, SinkError>;

    /// Release the session; later submits fail with `SinkError::Closed`
    fn close(&self);

    fn name(&self) -> &'static str;
}

/// Asynchronous acknowledgment raised by an order sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Added { key: OrderKey, price: Decimal },
    Updated { key: OrderKey, price: Decimal },
    Deleted { key: OrderKey },
    Filled { key: OrderKey, side: Side, price: Decimal },
}

impl OrderEvent {
    pub fn key(&self) -> OrderKey {
        match *self {
            Self::Added { key, .. }
            | Self::Updated { key, .. }
            | Self::Deleted { key }
            | Self::Filled { key, .. } => key,
        }
    }

    /// Acknowledgment a sink raises for a successfully handled action
    pub fn ack_for(request: &OrderRequest, key: OrderKey) -> Self {
        match request.action {
            OrderAction::Add => Self::Added {
                key,
                price: request.limit_price,
            },
            OrderAction::Change => Self::Updated {
                key,
                price: request.limit_price,
            },
            OrderAction::Delete => Self::Deleted { key },
        }
    }
}

impl From<OrderEvent> for LifecycleEvent {
    fn from(event: OrderEvent) -> Self {
        match event {
            OrderEvent::Added { key, .. } => LifecycleEvent::OrderAdded { key },
            OrderEvent::Updated { key, .. } => LifecycleEvent::OrderUpdated { key },
            OrderEvent::Deleted { key } => LifecycleEvent::OrderDeleted { key },
            OrderEvent::Filled { key, .. } => LifecycleEvent::OrderFilled { key },
        }
    }
}
