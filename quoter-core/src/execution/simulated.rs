//! Paper venue: order sink and market data for running without a venue
//!
//! `SimulatedOrderSink` assigns keys synchronously at submit time and
//! acknowledges every action from its own dispatcher thread, after an
//! optional delay, just as a real venue session calls back from its own
//! threads. Repriced orders can be filled at random.

use super::{OrderEvent, OrderSink};
use crate::config::SimulationConfig;
use crate::core::{OrderAction, OrderKey, OrderRequest, Side, SinkError};
use crate::lifecycle::LifecycleEvent;
use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reprices an order must see before it can fill
///
/// The warmup order is changed exactly once, so it never fills.
pub const FILLABLE_AFTER_CHANGES: u32 = 2;

enum Command {
    Submit(OrderRequest, OrderKey),
    Close,
}

struct Inner {
    next_key: AtomicU64,
    closed: AtomicBool,
    commands: Sender<Command>,
}

/// Cloneable handle to the paper venue
#[derive(Clone)]
pub struct SimulatedOrderSink {
    inner: Arc<Inner>,
}

impl SimulatedOrderSink {
    /// Start the dispatcher thread
    ///
    /// Acknowledgments arrive on the returned receiver.
    pub fn start(config: &SimulationConfig) -> std::io::Result<(Self, Receiver<OrderEvent>)> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        let venue = PaperVenue {
            book: HashMap::new(),
            fill_probability: if config.fill_probability.is_finite() {
                config.fill_probability.clamp(0.0, 1.0)
            } else {
                0.0
            },
            ack_delay: Duration::from_millis(config.ack_delay_ms),
            rng: StdRng::from_entropy(),
            events: event_tx,
        };

        thread::Builder::new()
            .name("paper-venue".to_string())
            .spawn(move || venue.run(cmd_rx))?;

        info!(
            fill_probability = config.fill_probability,
            ack_delay_ms = config.ack_delay_ms,
            "Simulated order sink started"
        );

        let sink = Self {
            inner: Arc::new(Inner {
                next_key: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                commands: cmd_tx,
            }),
        };
        Ok((sink, event_rx))
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn validate(&self, request: &OrderRequest) -> Result<OrderKey, SinkError> {
        match request.action {
            OrderAction::Add => {
                if request.quantity <= Decimal::ZERO {
                    return Err(SinkError::Rejected(format!(
                        "quantity must be positive, got {}",
                        request.quantity
                    )));
                }
                if request.limit_price <= Decimal::ZERO {
                    return Err(SinkError::Rejected(format!(
                        "limit price must be positive, got {}",
                        request.limit_price
                    )));
                }
                Ok(OrderKey(self.inner.next_key.fetch_add(1, Ordering::Relaxed) + 1))
            }
            OrderAction::Change | OrderAction::Delete => {
                let issued = self.inner.next_key.load(Ordering::Relaxed);
                if request.key.is_none() || request.key.as_u64() > issued {
                    return Err(SinkError::UnknownOrder(request.key));
                }
                Ok(request.key)
            }
        }
    }
}

impl OrderSink for SimulatedOrderSink {
    fn submit(&self, request: &OrderRequest) -> Result<OrderKey, SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        let key = self.validate(request)?;
        self.inner
            .commands
            .send(Command::Submit(*request, key))
            .map_err(|_| SinkError::Closed)?;
        Ok(key)
    }

    fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            // Queued actions ahead of this are still acknowledged
            let _ = self.inner.commands.send(Command::Close);
        }
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[derive(Debug, Clone, Copy)]
struct Resting {
    side: Side,
    price: Decimal,
    changes: u32,
}

/// Dispatcher-thread state
struct PaperVenue {
    book: HashMap<OrderKey, Resting>,
    fill_probability: f64,
    ack_delay: Duration,
    rng: StdRng,
    events: Sender<OrderEvent>,
}

impl PaperVenue {
    fn run(mut self, commands: Receiver<Command>) {
        for command in commands.iter() {
            match command {
                Command::Submit(request, key) => {
                    if !self.ack_delay.is_zero() {
                        thread::sleep(self.ack_delay);
                    }
                    self.apply(&request, key);
                }
                Command::Close => break,
            }
        }
        debug!(resting = self.book.len(), "Paper venue stopped");
    }

    fn apply(&mut self, request: &OrderRequest, key: OrderKey) {
        let resting = match request.action {
            OrderAction::Add => {
                let order = Resting {
                    side: request.side,
                    price: request.limit_price,
                    changes: 0,
                };
                self.book.insert(key, order);
                order
            }
            OrderAction::Change => match self.book.get_mut(&key) {
                Some(order) => {
                    order.price = request.limit_price;
                    order.changes += 1;
                    *order
                }
                None => {
                    // Already filled or cancelled
                    debug!(%key, "Change for an order no longer resting");
                    return;
                }
            },
            OrderAction::Delete => match self.book.remove(&key) {
                Some(order) => order,
                None => {
                    debug!(%key, "Delete for an order no longer resting");
                    return;
                }
            },
        };

        self.emit(OrderEvent::ack_for(request, key));

        let fillable =
            request.action == OrderAction::Change && resting.changes >= FILLABLE_AFTER_CHANGES;
        if fillable && self.rng.gen_bool(self.fill_probability) {
            self.book.remove(&key);
            info!(%key, side = %resting.side, price = %resting.price, "Simulated fill");
            self.emit(OrderEvent::Filled {
                key,
                side: resting.side,
                price: resting.price,
            });
        }
    }

    fn emit(&self, event: OrderEvent) {
        if self.events.send(event).is_err() {
            warn!("Order event receiver dropped");
        }
    }
}

/// Best-bid source for paper mode, derived from the feed's reference price
#[derive(Debug, Clone, Copy)]
pub struct SimulatedMarketData {
    tick_size: Decimal,
    half_spread_ticks: u32,
}

impl SimulatedMarketData {
    pub fn new(tick_size: Decimal, half_spread_ticks: u32) -> Self {
        Self {
            tick_size,
            half_spread_ticks,
        }
    }

    /// Reference floored to the tick grid, minus the half spread
    pub fn best_bid(&self, reference: f64) -> Option<Decimal> {
        if !reference.is_finite() || self.tick_size <= Decimal::ZERO {
            return None;
        }
        let reference = Decimal::from_f64(reference)?;
        let on_grid = (reference / self.tick_size).floor() * self.tick_size;
        let bid = on_grid - Decimal::from(self.half_spread_ticks) * self.tick_size;
        (bid > Decimal::ZERO).then_some(bid)
    }

    pub fn observe(&self, reference: Option<f64>) -> LifecycleEvent {
        LifecycleEvent::MarketObserved {
            best_bid: reference.and_then(|r| self.best_bid(r)),
        }
    }
}
