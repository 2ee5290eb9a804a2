//! Test helper utilities
//!
//! Provides:
//! - `RecordingListener` for read-loop tests
//! - Feed record builders
//! - Warmup driver for controller tests

use super::mock_sink::RecordingOrderSink;
use crate::core::OrderKey;
use crate::feed::PriceListener;
use crate::lifecycle::{LifecycleEvent, OrderLifecycleController};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Price listener that records every call
#[derive(Default)]
pub struct RecordingListener {
    connected: Mutex<Vec<f64>>,
    prices: Mutex<Vec<f64>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices delivered as "feed connected"
    pub fn connected(&self) -> Vec<f64> {
        self.connected.lock().clone()
    }

    /// Prices delivered to the quote path
    pub fn prices(&self) -> Vec<f64> {
        self.prices.lock().clone()
    }
}

impl PriceListener for RecordingListener {
    fn on_feed_connected(&self, price: f64) {
        self.connected.lock().push(price);
    }

    fn on_price(&self, price: f64) {
        self.prices.lock().push(price);
    }
}

/// One feed record line, newline-terminated
pub fn midprice_line(price: f64) -> String {
    format!("{{\"midprice\":{},\"instrument\":\"EUR/USD\"}}\n", price)
}

/// Walk a fresh controller through bootstrap and the warmup round trip
///
/// Returns the warmup order's key, or `None` if no warmup order was sent.
pub fn drive_to_ready(
    controller: &OrderLifecycleController<RecordingOrderSink>,
    tick_size: Decimal,
    best_bid: Decimal,
    first_price: f64,
) -> Option<OrderKey> {
    controller.dispatch(LifecycleEvent::InstrumentReady { tick_size });
    controller.on_feed_connected(first_price);
    controller.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(best_bid),
    });

    let key = controller.sink().last_key()?;
    controller.dispatch(LifecycleEvent::OrderAdded { key });
    controller.dispatch(LifecycleEvent::OrderUpdated { key });
    controller.dispatch(LifecycleEvent::OrderDeleted { key });
    Some(key)
}
