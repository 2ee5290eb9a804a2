//! Order lifecycle integration tests
//!
//! Drives `OrderLifecycleController` through whole sessions against the
//! recording sink, delivering acknowledgments by hand.

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use quoter_core::lifecycle::{
    ControllerSettings, LifecycleEvent, LifecycleState, Notification, Notifier,
    OrderLifecycleController, StopReason, WarmupStep,
};
use quoter_core::testing::{drive_to_ready, RecordingOrderSink};
use quoter_core::{
    LifecycleError, OrderAction, OrderKey, PriceListener, QuoteConfig, Side, SinkError,
};
use rust_decimal_macros::dec;

type Controller = OrderLifecycleController<RecordingOrderSink>;

fn controller() -> (Controller, Receiver<Notification>) {
    let (notifier, rx) = Notifier::channel();
    let controller =
        OrderLifecycleController::new(RecordingOrderSink::new(), ControllerSettings::default(), notifier);
    (controller, rx)
}

fn start_config() -> Result<QuoteConfig> {
    Ok(QuoteConfig::new(dec!(0), 4, dec!(0.25))?)
}

fn drain(rx: &Receiver<Notification>) -> Vec<Notification> {
    rx.try_iter().collect()
}

/// Ready controller with warmup traffic cleared
fn ready() -> Result<(Controller, Receiver<Notification>)> {
    let (c, rx) = controller();
    drive_to_ready(&c, dec!(0.25), dec!(99.75), 100.0).context("no warmup order sent")?;
    assert_eq!(c.state(), LifecycleState::Ready);
    c.sink().clear();
    drain(&rx);
    Ok((c, rx))
}

/// Quoting controller; returns the buy and sell keys
fn quoting() -> Result<(Controller, Receiver<Notification>, OrderKey, OrderKey)> {
    let (c, rx) = ready()?;
    c.dispatch(LifecycleEvent::Start(start_config()?));
    assert_eq!(c.state(), LifecycleState::Quoting);

    let sent = c.sink().sent();
    let buy = sent[0].1;
    let sell = sent[1].1;
    c.sink().clear();
    drain(&rx);
    Ok((c, rx, buy, sell))
}

#[test]
fn test_warmup_round_trip_reaches_ready_once() -> Result<()> {
    let (c, rx) = controller();

    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0.25) });
    assert_eq!(c.state(), LifecycleState::AwaitingFeed);

    c.on_feed_connected(100.0);
    assert_eq!(c.state(), LifecycleState::WarmupPending);

    c.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(dec!(99.75)),
    });
    assert_eq!(c.state(), LifecycleState::WarmupInFlight(WarmupStep::Add));

    // Warmup add sits 50 ticks under the bid
    let add = c.sink().requests()[0];
    assert_eq!(add.action, OrderAction::Add);
    assert_eq!(add.side, Side::Buy);
    assert_eq!(add.limit_price, dec!(87.25));
    let key = c.sink().last_key().context("warmup key")?;

    c.dispatch(LifecycleEvent::OrderAdded { key });
    assert_eq!(c.state(), LifecycleState::WarmupInFlight(WarmupStep::Update));
    let change = c.sink().requests()[1];
    assert_eq!(change.action, OrderAction::Change);
    assert_eq!(change.key, key);
    assert_eq!(change.limit_price, dec!(87.00));

    c.dispatch(LifecycleEvent::OrderUpdated { key });
    assert_eq!(c.state(), LifecycleState::WarmupInFlight(WarmupStep::Delete));
    assert_eq!(c.sink().requests()[2].action, OrderAction::Delete);

    c.dispatch(LifecycleEvent::OrderDeleted { key });
    assert_eq!(c.state(), LifecycleState::Ready);

    // Replayed acks and later market data start nothing new
    c.dispatch(LifecycleEvent::OrderAdded { key });
    c.dispatch(LifecycleEvent::OrderUpdated { key });
    c.dispatch(LifecycleEvent::OrderDeleted { key });
    c.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(dec!(99.50)),
    });
    assert_eq!(c.state(), LifecycleState::Ready);
    assert_eq!(c.sink().requests().len(), 3);

    let notes = drain(&rx);
    let ready_count = notes
        .iter()
        .filter(|n| matches!(n, Notification::StateChanged { to: LifecycleState::Ready, .. }))
        .count();
    assert_eq!(ready_count, 1);
    let connected: Vec<_> = notes
        .iter()
        .filter(|n| matches!(n, Notification::FeedConnected { .. }))
        .collect();
    assert_eq!(connected, vec![&Notification::FeedConnected { price: 100.0 }]);

    Ok(())
}

#[test]
fn test_feed_connected_announced_only_after_warmup() -> Result<()> {
    let (c, rx) = controller();
    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0.25) });
    c.on_feed_connected(100.0);
    c.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(dec!(99.75)),
    });

    assert!(!drain(&rx)
        .iter()
        .any(|n| matches!(n, Notification::FeedConnected { .. })));

    let key = c.sink().last_key().context("warmup key")?;
    c.dispatch(LifecycleEvent::OrderAdded { key });
    c.dispatch(LifecycleEvent::OrderUpdated { key });
    c.dispatch(LifecycleEvent::OrderDeleted { key });

    assert!(drain(&rx)
        .iter()
        .any(|n| matches!(n, Notification::FeedConnected { price } if *price == 100.0)));
    Ok(())
}

#[test]
fn test_bootstrap_signals_in_either_order() {
    let (c, _rx) = controller();

    // Feed first, instrument second
    c.on_feed_connected(1.2345);
    assert_eq!(c.state(), LifecycleState::AwaitingInstrument);
    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0.0001) });
    assert_eq!(c.state(), LifecycleState::WarmupPending);
    assert_eq!(c.latest_price(), Some(1.2345));
    assert_eq!(c.tick_size(), Some(dec!(0.0001)));
}

#[test]
fn test_warmup_waits_for_usable_best_bid() {
    let (c, _rx) = controller();
    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0.25) });
    c.on_feed_connected(100.0);

    c.dispatch(LifecycleEvent::MarketObserved { best_bid: None });
    c.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(dec!(0)),
    });
    assert_eq!(c.state(), LifecycleState::WarmupPending);
    assert!(c.sink().requests().is_empty());
}

#[test]
fn test_foreign_acks_do_not_advance_warmup() -> Result<()> {
    let (c, _rx) = controller();
    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0.25) });
    c.on_feed_connected(100.0);
    c.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(dec!(99.75)),
    });
    let key = c.sink().last_key().context("warmup key")?;
    let other = OrderKey(key.as_u64() + 100);

    c.dispatch(LifecycleEvent::OrderAdded { key: other });
    c.dispatch(LifecycleEvent::OrderUpdated { key });
    c.dispatch(LifecycleEvent::OrderDeleted { key });
    assert_eq!(c.state(), LifecycleState::WarmupInFlight(WarmupStep::Add));
    assert_eq!(c.sink().requests().len(), 1);
    Ok(())
}

#[test]
fn test_start_places_both_sides() -> Result<()> {
    let (c, rx) = ready()?;

    // Nothing to stop yet
    c.dispatch(LifecycleEvent::Stop);
    assert_eq!(c.state(), LifecycleState::Ready);

    c.dispatch(LifecycleEvent::Start(QuoteConfig::new(dec!(0.10), 4, dec!(0.25))?));
    assert_eq!(c.state(), LifecycleState::Quoting);

    // mid 100.00 + 0.10 = 100.10, half width 1.00 -> 99.10 / 101.10 -> 99.00 / 101.25
    let sent = c.sink().requests();
    assert_eq!(sent.len(), 2);
    assert_eq!((sent[0].action, sent[0].side), (OrderAction::Add, Side::Buy));
    assert_eq!(sent[0].limit_price, dec!(99.00));
    assert_eq!((sent[1].action, sent[1].side), (OrderAction::Add, Side::Sell));
    assert_eq!(sent[1].limit_price, dec!(101.25));

    let view = c.quotes();
    assert!(view.buy_live && view.sell_live);
    assert!(drain(&rx).contains(&Notification::QuotingStarted {
        buy: dec!(99.00),
        sell: dec!(101.25),
    }));

    // Second start while quoting is ignored
    c.dispatch(LifecycleEvent::Start(start_config()?));
    assert_eq!(c.sink().requests().len(), 2);
    Ok(())
}

#[test]
fn test_fill_unwinds_both_sides() -> Result<()> {
    let (c, rx, buy, sell) = quoting()?;

    c.dispatch(LifecycleEvent::OrderFilled { key: buy });
    assert_eq!(c.state(), LifecycleState::Stopped);

    let deletes: Vec<_> = c
        .sink()
        .requests()
        .into_iter()
        .filter(|r| r.action == OrderAction::Delete)
        .map(|r| r.key)
        .collect();
    assert_eq!(deletes, vec![buy, sell]);
    assert_eq!(c.stats().fills_received, 1);
    assert!(drain(&rx).contains(&Notification::QuotingStopped {
        reason: StopReason::Filled { side: Side::Buy },
    }));

    // No repricing once stopped
    c.sink().clear();
    c.on_price(120.0);
    assert!(c.sink().requests().is_empty());

    // A second fill report for the other side changes nothing
    c.dispatch(LifecycleEvent::OrderFilled { key: sell });
    assert_eq!(c.state(), LifecycleState::Stopped);
    assert!(c.sink().requests().is_empty());
    Ok(())
}

#[test]
fn test_fill_for_unknown_order_is_ignored() -> Result<()> {
    let (c, _rx, _buy, _sell) = quoting()?;
    c.dispatch(LifecycleEvent::OrderFilled { key: OrderKey(9999) });
    assert_eq!(c.state(), LifecycleState::Quoting);
    assert!(c.sink().requests().is_empty());
    Ok(())
}

#[test]
fn test_stop_then_restart() -> Result<()> {
    let (c, _rx, buy, sell) = quoting()?;

    c.dispatch(LifecycleEvent::Stop);
    assert_eq!(c.state(), LifecycleState::Stopped);
    assert_eq!(c.sink().count(OrderAction::Delete), 2);

    // Delete acks release the keys
    c.dispatch(LifecycleEvent::OrderDeleted { key: buy });
    c.dispatch(LifecycleEvent::OrderDeleted { key: sell });
    let view = c.quotes();
    assert!(view.buy_key.is_none() && view.sell_key.is_none());

    c.sink().clear();
    c.on_price(101.0);
    c.dispatch(LifecycleEvent::Start(start_config()?));
    assert_eq!(c.state(), LifecycleState::Quoting);

    let sent = c.sink().sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(r, _)| r.action == OrderAction::Add));
    assert!(sent.iter().all(|(_, k)| *k != buy && *k != sell));
    // Restarted around the latest price, not the first one
    assert_eq!(sent[0].0.limit_price, dec!(100.00));
    assert_eq!(sent[1].0.limit_price, dec!(102.00));
    Ok(())
}

#[test]
fn test_delete_ack_for_live_quote_keeps_quote() -> Result<()> {
    let (c, _rx, buy, _sell) = quoting()?;
    c.dispatch(LifecycleEvent::OrderDeleted { key: buy });
    assert_eq!(c.state(), LifecycleState::Quoting);
    assert_eq!(c.quotes().buy_key, buy);
    assert!(c.quotes().buy_live);
    Ok(())
}

#[test]
fn test_shutdown_from_every_state() -> Result<()> {
    let tick = dec!(0.25);
    let script: Vec<(LifecycleState, usize)> = vec![
        (LifecycleState::AwaitingInstrument, 0),
        (LifecycleState::AwaitingFeed, 0),
        (LifecycleState::WarmupPending, 0),
        (LifecycleState::WarmupInFlight(WarmupStep::Add), 1),
        (LifecycleState::WarmupInFlight(WarmupStep::Update), 1),
        // Warmup delete already sent
        (LifecycleState::WarmupInFlight(WarmupStep::Delete), 0),
        (LifecycleState::Ready, 0),
        (LifecycleState::Quoting, 2),
        (LifecycleState::Stopped, 0),
    ];

    for (steps, (expected_state, expected_deletes)) in script.into_iter().enumerate() {
        let (c, rx) = controller();
        let mut warmup_key = OrderKey::NONE;

        for step in 0..steps {
            match step {
                0 => c.dispatch(LifecycleEvent::InstrumentReady { tick_size: tick }),
                1 => c.on_feed_connected(100.0),
                2 => {
                    c.dispatch(LifecycleEvent::MarketObserved {
                        best_bid: Some(dec!(99.75)),
                    });
                    warmup_key = c.sink().last_key().context("warmup key")?;
                }
                3 => c.dispatch(LifecycleEvent::OrderAdded { key: warmup_key }),
                4 => c.dispatch(LifecycleEvent::OrderUpdated { key: warmup_key }),
                5 => c.dispatch(LifecycleEvent::OrderDeleted { key: warmup_key }),
                6 => c.dispatch(LifecycleEvent::Start(start_config()?)),
                7 => c.dispatch(LifecycleEvent::Stop),
                _ => unreachable!(),
            }
        }
        assert_eq!(c.state(), expected_state, "setup for {}", expected_state);

        c.sink().clear();
        drain(&rx);
        c.dispatch(LifecycleEvent::Shutdown);

        assert_eq!(c.state(), LifecycleState::Terminated, "from {}", expected_state);
        assert_eq!(
            c.sink().count(OrderAction::Delete),
            expected_deletes,
            "deletes from {}",
            expected_state
        );
        assert_eq!(c.sink().requests().len(), expected_deletes);
        assert!(c.sink().is_closed());
        assert!(drain(&rx).contains(&Notification::StateChanged {
            from: expected_state,
            to: LifecycleState::Terminated,
        }));
    }
    Ok(())
}

#[test]
fn test_events_after_shutdown_are_ignored() -> Result<()> {
    let (c, rx, buy, sell) = quoting()?;
    c.dispatch(LifecycleEvent::Shutdown);
    drain(&rx);

    c.dispatch(LifecycleEvent::OrderDeleted { key: buy });
    c.dispatch(LifecycleEvent::OrderFilled { key: sell });
    c.dispatch(LifecycleEvent::Start(start_config()?));
    c.dispatch(LifecycleEvent::Shutdown);
    c.on_price(130.0);

    assert_eq!(c.state(), LifecycleState::Terminated);
    assert_eq!(c.sink().count(OrderAction::Add), 0);
    assert!(drain(&rx).is_empty());
    Ok(())
}

#[test]
fn test_sink_failure_during_warmup_is_fatal() {
    let (c, rx) = controller();
    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0.25) });
    c.on_feed_connected(100.0);

    c.sink().fail_next(SinkError::Rejected("market closed".to_string()));
    c.dispatch(LifecycleEvent::MarketObserved {
        best_bid: Some(dec!(99.75)),
    });

    assert_eq!(c.state(), LifecycleState::Terminated);
    assert!(c.sink().is_closed());
    let fatal = drain(&rx).into_iter().find_map(|n| match n {
        Notification::Fatal(message) => Some(message),
        _ => None,
    });
    assert!(fatal.is_some_and(|m| m.contains("market closed")));
}

#[test]
fn test_invalid_tick_size_is_fatal() {
    let (c, _rx) = controller();
    c.dispatch(LifecycleEvent::InstrumentReady { tick_size: dec!(0) });
    assert_eq!(c.state(), LifecycleState::Terminated);
}

#[test]
fn test_start_on_foreign_grid_is_rejected() -> Result<()> {
    let (c, rx) = ready()?;
    let half_tick = QuoteConfig::new(dec!(0), 4, dec!(0.5))?;

    let err = c.handle(LifecycleEvent::Start(half_tick));
    assert!(matches!(
        err,
        Err(LifecycleError::TickSizeMismatch { instrument, quote })
            if instrument == dec!(0.25) && quote == dec!(0.5)
    ));
    assert!(c.sink().requests().is_empty());
    assert_eq!(c.quote_config(), None);

    c.dispatch(LifecycleEvent::Start(half_tick));
    assert_eq!(c.state(), LifecycleState::Terminated);
    assert!(c.sink().requests().is_empty());
    assert!(c.sink().is_closed());
    let fatal = drain(&rx).into_iter().find_map(|n| match n {
        Notification::Fatal(message) => Some(message),
        _ => None,
    });
    assert!(fatal.is_some_and(|m| m.contains("does not match instrument tick size")));
    Ok(())
}

#[test]
fn test_status_snapshot() -> Result<()> {
    let (c, _rx, buy, sell) = quoting()?;
    c.on_price(100.30);

    let status = c.status();
    assert_eq!(status.state, LifecycleState::Quoting);
    assert_eq!(status.latest_price, Some(100.30));
    assert_eq!(status.quotes.buy_key, buy);
    assert_eq!(status.quotes.sell_key, sell);
    assert_eq!(status.stats.changes_sent, 2);
    assert_eq!(c.quote_config(), Some(start_config()?));
    Ok(())
}
