//! Status notifications for presentation layers
//!
//! The controller never touches a UI. It pushes `Notification`s into an
//! unbounded channel from whichever thread handled the event; the consumer
//! does its own thread marshaling.

use super::state::{LifecycleState, StopReason};
use crossbeam_channel::{Receiver, Sender};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StateChanged {
        from: LifecycleState,
        to: LifecycleState,
    },
    /// Warmup finished and the feed is delivering prices
    FeedConnected { price: f64 },
    QuotingStarted { buy: Decimal, sell: Decimal },
    QuotingStopped { reason: StopReason },
    /// Human-readable reason for the shutdown that follows
    Fatal(String),
}

/// Sending half; sends never block
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<Sender<Notification>>,
}

impl Notifier {
    pub fn channel() -> (Self, Receiver<Notification>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx: Some(tx) }, rx)
    }

    /// Notifier that drops everything
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, notification: Notification) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening any more
            if tx.send(notification).is_err() {
                tracing::trace!("notification receiver dropped");
            }
        }
    }
}
