//! Order Lifecycle Controller
//!
//! One explicit state machine for bootstrap, warmup, quoting and shutdown.
//!
//! ## Threads
//!
//! - **Control path** (`dispatch`): order-sink acknowledgments, start/stop
//!   commands, bootstrap signals. Serialized by one mutex. May run on any
//!   thread, including the sink's dispatcher threads.
//! - **Hot path** (`PriceListener::on_price`): the feed reader thread. Never
//!   takes the control mutex. It writes the latest price, reads the live
//!   flags and loads the `HotQuoteConfig` snapshot. The snapshot is too
//!   wide for a native atomic, so `AtomicCell` publishes it through a
//!   seqlock: single writer (the control path), and a load that overlaps a
//!   store retries instead of blocking on the mutex.
//!
//! The control path publishes the config snapshot before arming any side,
//! and arming stores `live` with Release, so a hot path that sees both sides
//! live also sees the config they were started with.
//!
//! ## Failure
//!
//! Any `Err` from handling an event is fatal: `dispatch` emits
//! `Notification::Fatal` and runs the shutdown transition.

use super::notify::{Notification, Notifier};
use super::state::{LifecycleEvent, LifecycleState, StopReason, WarmupStep};
use super::warmup::WarmupCycle;
use crate::config::{AppConfig, WarmupConfig};
use crate::core::{LifecycleError, OrderAction, OrderKey, OrderRequest, Side, Ticks, TimeInForce};
use crate::execution::OrderSink;
use crate::feed::{FeedIngester, PriceListener};
use crate::perf::{MetricsSnapshot, QuoteMetrics};
use crate::quote::{HotQuoteConfig, QuoteConfig, QuoteEngine, QuotePair, QuotePairView, Reprice};
use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use tracing::{debug, error, info, trace, warn};

/// Order parameters shared by warmup and quote orders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub warmup: WarmupConfig,
    pub quantity: Decimal,
    pub time_in_force: TimeInForce,
}

impl ControllerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            warmup: config.warmup,
            quantity: config.instrument.order_quantity,
            time_in_force: config.instrument.time_in_force,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Point-in-time view for status displays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerStatus {
    pub state: LifecycleState,
    pub latest_price: Option<f64>,
    pub quotes: QuotePairView,
    pub stats: MetricsSnapshot,
}

/// State touched only under the control mutex
#[derive(Debug)]
struct ControlState {
    state: LifecycleState,
    tick_size: Option<Decimal>,
    /// First feed price, once connected
    feed_price: Option<f64>,
    warmup: Option<WarmupCycle>,
    warmup_done: bool,
    announced: bool,
    config: Option<QuoteConfig>,
}

impl ControlState {
    fn new() -> Self {
        Self {
            state: LifecycleState::AwaitingInstrument,
            tick_size: None,
            feed_price: None,
            warmup: None,
            warmup_done: false,
            announced: false,
            config: None,
        }
    }
}

pub struct OrderLifecycleController<S: OrderSink> {
    sink: S,
    settings: ControllerSettings,
    quotes: QuotePair,
    hot: AtomicCell<HotQuoteConfig>,
    /// f64 bits; NaN until the first price
    latest_price: AtomicU64,
    metrics: QuoteMetrics,
    state_view: AtomicU8,
    control: Mutex<ControlState>,
    feed: Mutex<Option<FeedIngester>>,
    notifier: Notifier,
}

impl<S: OrderSink> OrderLifecycleController<S> {
    pub fn new(sink: S, settings: ControllerSettings, notifier: Notifier) -> Self {
        Self {
            sink,
            settings,
            quotes: QuotePair::new(),
            hot: AtomicCell::new(HotQuoteConfig::UNSET),
            latest_price: AtomicU64::new(f64::NAN.to_bits()),
            metrics: QuoteMetrics::new(),
            state_view: AtomicU8::new(LifecycleState::AwaitingInstrument.as_u8()),
            control: Mutex::new(ControlState::new()),
            feed: Mutex::new(None),
            notifier,
        }
    }

    /// Handle one event; any failure shuts the controller down
    pub fn dispatch(&self, event: LifecycleEvent) {
        let name = event.name();
        if let Err(err) = self.handle(event) {
            error!(event = name, "Event handling failed: {}", err);
            self.abort(&err.to_string());
        }
    }

    /// Transition table
    ///
    /// Events that have no transition in the current state are logged at
    /// debug and dropped.
    pub fn handle(&self, event: LifecycleEvent) -> Result<(), LifecycleError> {
        use LifecycleEvent as E;
        use LifecycleState as St;

        if let E::Shutdown = event {
            self.terminate();
            return Ok(());
        }

        let mut ctl = self.control.lock();
        match (ctl.state, event) {
            (St::Terminated, event) => {
                debug!(event = event.name(), "Event after shutdown ignored");
            }

            (_, E::InstrumentReady { tick_size }) => self.on_instrument(&mut ctl, tick_size)?,
            (_, E::FeedConnected { price }) => self.on_feed_connected_event(&mut ctl, price),

            (St::WarmupPending, E::MarketObserved { best_bid }) => {
                self.begin_warmup(&mut ctl, best_bid)?
            }
            (St::WarmupInFlight(WarmupStep::Add), E::OrderAdded { key }) => {
                let next = ctl.warmup.as_mut().and_then(|w| w.on_added(key));
                if let Some(request) = next {
                    self.submit(&request, "warmup update")?;
                    self.transition(&mut ctl, St::WarmupInFlight(WarmupStep::Update));
                } else {
                    debug!(%key, "Added ack does not match warmup order");
                }
            }
            (St::WarmupInFlight(WarmupStep::Update), E::OrderUpdated { key }) => {
                let next = ctl.warmup.as_mut().and_then(|w| w.on_updated(key));
                if let Some(request) = next {
                    self.submit(&request, "warmup delete")?;
                    self.transition(&mut ctl, St::WarmupInFlight(WarmupStep::Delete));
                } else {
                    debug!(%key, "Updated ack does not match warmup order");
                }
            }
            (St::WarmupInFlight(WarmupStep::Delete), E::OrderDeleted { key }) => {
                if ctl.warmup.as_mut().is_some_and(|w| w.on_deleted(key)) {
                    self.finish_warmup(&mut ctl);
                } else {
                    self.forget_order(key);
                }
            }
            (_, E::OrderDeleted { key }) => self.forget_order(key),

            (St::Quoting, E::OrderFilled { key }) => self.on_fill(&mut ctl, key)?,

            (state, E::Start(config)) if state.can_start() => {
                self.start_quoting(&mut ctl, config)?
            }
            (St::Quoting, E::Stop) => self.stop_quoting(&mut ctl, StopReason::UserRequested)?,

            (state, event) => {
                debug!(%state, event = event.name(), "Event ignored in this state");
            }
        }
        Ok(())
    }

    /// Report a fatal condition and shut down
    pub fn abort(&self, message: &str) {
        error!("FATAL: {}", message);
        self.notifier.send(Notification::Fatal(message.to_string()));
        self.terminate();
    }

    /// Unconditional shutdown, valid from every state
    ///
    /// Cancels live quotes and any in-flight warmup order, stops the feed
    /// and closes the sink. Does not wait for delete acknowledgments.
    pub fn terminate(&self) {
        {
            let mut ctl = self.control.lock();
            if ctl.state.is_terminal() {
                return;
            }

            if let Err(e) = self.unwind() {
                warn!("Cancel during shutdown failed: {}", e);
            }

            if let Some(cancel) = ctl.warmup.take().and_then(|w| w.cancel_request()) {
                if let Err(e) = self.submit(&cancel, "warmup cancel") {
                    warn!("Warmup cancel during shutdown failed: {}", e);
                }
            }

            self.transition(&mut ctl, LifecycleState::Terminated);
        }

        let feed = self.feed.lock().take();
        if let Some(feed) = feed {
            if let Err(e) = feed.stop() {
                warn!("Failed to stop feed: {}", e);
            }
        }

        self.sink.close();
        info!(sink = self.sink.name(), "Controller terminated");
    }

    /// Hand over the running feed so shutdown can stop it
    ///
    /// A feed attached after shutdown is stopped immediately.
    pub fn attach_feed(&self, feed: FeedIngester) {
        let ctl = self.control.lock();
        if ctl.state.is_terminal() {
            drop(ctl);
            if let Err(e) = feed.stop() {
                warn!("Failed to stop late feed: {}", e);
            }
            return;
        }
        *self.feed.lock() = Some(feed);
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state_view.load(Ordering::Acquire))
            .unwrap_or(LifecycleState::Terminated)
    }

    /// Most recent feed price, if any has arrived
    pub fn latest_price(&self) -> Option<f64> {
        let price = f64::from_bits(self.latest_price.load(Ordering::Relaxed));
        (!price.is_nan()).then_some(price)
    }

    pub fn quotes(&self) -> QuotePairView {
        self.quotes.view()
    }

    /// Configuration of the current or last quoting run
    pub fn quote_config(&self) -> Option<QuoteConfig> {
        self.control.lock().config
    }

    pub fn tick_size(&self) -> Option<Decimal> {
        self.control.lock().tick_size
    }

    pub fn stats(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            state: self.state(),
            latest_price: self.latest_price(),
            quotes: self.quotes(),
            stats: self.stats(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ===== Transitions =====

    fn on_instrument(&self, ctl: &mut ControlState, tick_size: Decimal) -> Result<(), LifecycleError> {
        if tick_size <= Decimal::ZERO {
            return Err(LifecycleError::NoInstrument);
        }
        if ctl.tick_size.is_some() {
            debug!(%tick_size, "Instrument already configured");
            return Ok(());
        }
        info!(%tick_size, "Instrument ready");
        ctl.tick_size = Some(tick_size);
        self.advance_bootstrap(ctl);
        Ok(())
    }

    fn on_feed_connected_event(&self, ctl: &mut ControlState, price: f64) {
        if ctl.feed_price.is_some() {
            debug!(price, "Feed already connected");
            return;
        }
        info!(price, "First feed price received");
        ctl.feed_price = Some(price);
        if self.latest_price().is_none() {
            self.latest_price.store(price.to_bits(), Ordering::Relaxed);
        }
        self.advance_bootstrap(ctl);
        self.announce_if_connected(ctl);
    }

    /// Instrument and feed may report in either order
    fn advance_bootstrap(&self, ctl: &mut ControlState) {
        if ctl.state == LifecycleState::AwaitingInstrument && ctl.tick_size.is_some() {
            self.transition(ctl, LifecycleState::AwaitingFeed);
        }
        if ctl.state == LifecycleState::AwaitingFeed && ctl.feed_price.is_some() {
            self.transition(ctl, LifecycleState::WarmupPending);
        }
    }

    fn begin_warmup(
        &self,
        ctl: &mut ControlState,
        best_bid: Option<Decimal>,
    ) -> Result<(), LifecycleError> {
        let Some(best_bid) = best_bid else {
            trace!("Market observation without best bid");
            return Ok(());
        };
        let tick_size = ctl.tick_size.ok_or(LifecycleError::NoInstrument)?;

        let Some(mut cycle) = WarmupCycle::plan(
            best_bid,
            tick_size,
            self.settings.warmup,
            self.settings.quantity,
            self.settings.time_in_force,
        ) else {
            trace!(%best_bid, "Best bid not usable for warmup");
            return Ok(());
        };

        let request = cycle.add_request();
        let key = self.submit(&request, "warmup add")?;
        cycle.mark_sent(key);
        ctl.warmup = Some(cycle);

        info!(%best_bid, price = %request.limit_price, %key, "Warmup order sent");
        self.transition(ctl, LifecycleState::WarmupInFlight(WarmupStep::Add));
        Ok(())
    }

    fn finish_warmup(&self, ctl: &mut ControlState) {
        ctl.warmup = None;
        ctl.warmup_done = true;
        info!("Warmup round trip complete");
        if ctl.feed_price.is_some() {
            self.transition(ctl, LifecycleState::Ready);
        }
        self.announce_if_connected(ctl);
    }

    /// "Connected" is only visible once warmup is done as well
    fn announce_if_connected(&self, ctl: &mut ControlState) {
        if ctl.announced || !ctl.warmup_done {
            return;
        }
        if let Some(price) = ctl.feed_price {
            ctl.announced = true;
            info!(price, "Feed connected");
            self.notifier.send(Notification::FeedConnected { price });
        }
    }

    fn forget_order(&self, key: OrderKey) {
        match self.quotes.side_of(key) {
            Some(side) if self.quotes.side(side).is_live() => {
                warn!(%side, %key, "Delete ack for a live quote ignored");
            }
            Some(side) => {
                self.quotes.side(side).clear_key_if(key);
                debug!(%side, %key, "Quote order deleted");
            }
            None => debug!(%key, "Delete ack for unknown order ignored"),
        }
    }

    fn on_fill(&self, ctl: &mut ControlState, key: OrderKey) -> Result<(), LifecycleError> {
        let Some(side) = self.quotes.side_of(key) else {
            debug!(%key, "Fill for unknown order ignored");
            return Ok(());
        };
        self.metrics.inc_fills();
        info!(%side, %key, "Quote filled, unwinding both sides");
        self.stop_quoting(ctl, StopReason::Filled { side })
    }

    fn start_quoting(&self, ctl: &mut ControlState, config: QuoteConfig) -> Result<(), LifecycleError> {
        let instrument = ctl.tick_size.ok_or(LifecycleError::NoInstrument)?;
        if config.tick_size() != instrument {
            return Err(LifecycleError::TickSizeMismatch {
                instrument,
                quote: config.tick_size(),
            });
        }
        let reference = self.latest_price().ok_or(LifecycleError::NoReferencePrice)?;
        let unrepresentable = || LifecycleError::UnrepresentablePrice { price: reference };
        let exact = Decimal::from_f64(reference).ok_or_else(unrepresentable)?;

        let prices = QuoteEngine::exact(exact, &config);
        let ticks = QuoteEngine::exact_ticks(exact, &config).ok_or_else(unrepresentable)?;

        // Publish before arming
        self.hot.store(config.hot());
        ctl.config = Some(config);

        let buy_key = self.submit(&self.order(Side::Buy, prices.buy), "quote buy add")?;
        self.quotes.buy.arm(buy_key, ticks.buy);
        let sell_key = self.submit(&self.order(Side::Sell, prices.sell), "quote sell add")?;
        self.quotes.sell.arm(sell_key, ticks.sell);

        info!(
            reference,
            offset = %config.offset(),
            ticks = config.tick_count(),
            buy = %prices.buy,
            sell = %prices.sell,
            "Quoting started"
        );
        self.transition(ctl, LifecycleState::Quoting);
        self.notifier.send(Notification::QuotingStarted {
            buy: prices.buy,
            sell: prices.sell,
        });
        Ok(())
    }

    fn stop_quoting(&self, ctl: &mut ControlState, reason: StopReason) -> Result<(), LifecycleError> {
        let result = self.unwind();
        info!(%reason, "Quoting stopped");
        self.transition(ctl, LifecycleState::Stopped);
        self.notifier.send(Notification::QuotingStopped { reason });
        result
    }

    /// Mark both sides not live, then cancel every side that was live
    ///
    /// Attempts every cancel and reports the first failure.
    fn unwind(&self) -> Result<(), LifecycleError> {
        let disarmed = Side::BOTH.map(|side| (side, self.quotes.side(side).disarm()));
        let tick_size = self.hot.load().tick_size_exact;

        let mut first_err = None;
        for (side, key) in disarmed {
            let Some(key) = key else { continue };
            let price = self.quotes.side(side).resting().to_decimal(tick_size);
            let request = self.order(side, price).delete(key);
            if let Err(e) = self.submit(&request, "quote cancel") {
                error!(%side, %key, "Cancel failed: {}", e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    // ===== Helpers =====

    fn transition(&self, ctl: &mut ControlState, to: LifecycleState) {
        let from = ctl.state;
        if from == to {
            return;
        }
        ctl.state = to;
        self.state_view.store(to.as_u8(), Ordering::Release);
        info!(%from, %to, "Lifecycle transition");
        self.notifier.send(Notification::StateChanged { from, to });
    }

    fn order(&self, side: Side, price: Decimal) -> OrderRequest {
        OrderRequest::add(side, price, self.settings.quantity, self.settings.time_in_force)
    }

    fn submit(&self, request: &OrderRequest, stage: &'static str) -> Result<OrderKey, LifecycleError> {
        let key = self
            .sink
            .submit(request)
            .map_err(|source| LifecycleError::Sink { stage, source })?;
        debug!(stage, %request, %key, "Order sent");
        Ok(key)
    }

    /// Move one side to `target` if it changed
    #[inline(always)]
    fn refresh_side(&self, side: Side, target: Ticks, cfg: &HotQuoteConfig) {
        let quote = self.quotes.side(side);
        let key = match quote.reprice(target) {
            Reprice::Moved(key) => key,
            Reprice::Unchanged => {
                self.metrics.inc_suppressed();
                return;
            }
            Reprice::Idle => return,
        };

        let request = OrderRequest {
            action: OrderAction::Change,
            key,
            side,
            limit_price: target.to_decimal(cfg.tick_size_exact),
            quantity: self.settings.quantity,
            time_in_force: self.settings.time_in_force,
        };

        match self.sink.submit(&request) {
            Ok(_) => {
                self.metrics.inc_changes();
                trace!(%side, ticks = target.0, "Quote moved");
            }
            // Lost a race with stop or fill; the order is already being cancelled
            Err(e) if !quote.is_live() => trace!(%side, "Change after unwind rejected: {}", e),
            Err(e) => self.abort(&format!("quote refresh failed for {} side: {}", side, e)),
        }
    }
}

impl<S: OrderSink> PriceListener for OrderLifecycleController<S> {
    fn on_feed_connected(&self, price: f64) {
        self.latest_price.store(price.to_bits(), Ordering::Relaxed);
        self.dispatch(LifecycleEvent::FeedConnected { price });
    }

    /// Hot path
    #[inline]
    fn on_price(&self, price: f64) {
        self.latest_price.store(price.to_bits(), Ordering::Relaxed);
        self.metrics.inc_prices();

        if !self.quotes.both_live() {
            return;
        }

        let cfg = self.hot.load();
        self.metrics.inc_refreshes();
        let target = QuoteEngine::hot_ticks(price, &cfg);
        self.refresh_side(Side::Buy, target.buy, &cfg);
        self.refresh_side(Side::Sell, target.sell, &cfg);
    }
}
