//! Paper quoting session - NO REAL ORDERS
//!
//! Runs the full session against the simulated venue:
//! - Real feed subprocess (defaults from config, or `--feed-program`)
//! - Simulated best bid derived from the reference price, for warmup
//! - Interactive `start` / `stop` / `status` / `quit` on stdin
//!
//! Try it with the bundled random-walk feed:
//!
//! ```text
//! quoter-paper --tick-size 0.0001 --feed-program price-sim
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::select;
use quoter_bins::commands::{print_help, print_status, spawn_stdin_reader, QuoteCommand};
use quoter_bins::common::{load_config, print_stats, setup_performance, start_feed, CommonArgs};
use quoter_core::execution::{SimulatedMarketData, SimulatedOrderSink};
use quoter_core::lifecycle::{
    ControllerSettings, LifecycleEvent, LifecycleState, Notification, Notifier,
    OrderLifecycleController,
};
use quoter_core::resilience::{install_panic_handler, KillSwitch};
use quoter_core::utils::init_logger;
use quoter_core::QuoteConfig;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

type PaperController = OrderLifecycleController<SimulatedOrderSink>;

fn main() -> Result<()> {
    let args = CommonArgs::parse();
    let config = load_config(&args)?;

    init_logger(&config.logging.level, config.logging.json);
    install_panic_handler();

    info!("=== Quoter: PAPER TRADING ===");
    warn!("PAPER TRADING MODE - orders go to the simulated venue only");
    info!(
        instrument = %config.instrument.name,
        tick_size = %config.instrument.tick_size,
        quantity = %config.instrument.order_quantity,
        "Instrument"
    );

    setup_performance(args.realtime);
    let kill_switch = KillSwitch::install();

    let (sink, order_events) =
        SimulatedOrderSink::start(&config.simulation).context("failed to start paper venue")?;
    let (notifier, notifications) = Notifier::channel();
    let controller = Arc::new(OrderLifecycleController::new(
        sink,
        ControllerSettings::from_config(&config),
        notifier,
    ));

    let tick_size = config.instrument.tick_size;
    controller.dispatch(LifecycleEvent::InstrumentReady { tick_size });

    if let Err(e) = start_feed(&controller, &config.feed) {
        for note in notifications.try_iter() {
            report(&note);
        }
        return Err(e);
    }

    let commands = spawn_stdin_reader().context("failed to start stdin reader")?;
    let market = SimulatedMarketData::new(tick_size, config.simulation.half_spread_ticks);
    let ticker = crossbeam_channel::tick(Duration::from_millis(
        config.simulation.market_data_interval_ms,
    ));

    print_help();

    while !kill_switch.should_stop() {
        select! {
            recv(order_events) -> event => match event {
                Ok(event) => controller.dispatch(event.into()),
                Err(_) => {
                    warn!("Paper venue event stream closed");
                    break;
                }
            },
            recv(commands) -> line => match line {
                Ok(line) => {
                    if !handle_command(&controller, &line, tick_size) {
                        break;
                    }
                }
                Err(_) => {
                    info!("stdin closed, shutting down");
                    break;
                }
            },
            recv(notifications) -> note => {
                if let Ok(note) = note {
                    report(&note);
                }
            },
            recv(ticker) -> _ => {
                if controller.state() == LifecycleState::WarmupPending {
                    controller.dispatch(market.observe(controller.latest_price()));
                }
            },
        }

        if controller.state().is_terminal() {
            break;
        }
    }

    if kill_switch.is_emergency() {
        error!("Emergency stop, exiting without waiting for cancels");
        std::process::exit(130);
    }

    controller.dispatch(LifecycleEvent::Shutdown);
    for note in notifications.try_iter() {
        report(&note);
    }
    print_stats(&controller.status());
    Ok(())
}

/// Returns `false` when the session should end
fn handle_command(controller: &PaperController, line: &str, tick_size: Decimal) -> bool {
    if line.trim().is_empty() {
        return true;
    }

    match line.parse::<QuoteCommand>() {
        Ok(QuoteCommand::Start { offset, ticks }) => {
            let state = controller.state();
            if !state.can_start() {
                println!("cannot start while {}", state);
                return true;
            }
            match QuoteConfig::new(offset, ticks, tick_size) {
                Ok(config) => controller.dispatch(LifecycleEvent::Start(config)),
                Err(e) => println!("{}", e),
            }
        }
        Ok(QuoteCommand::Stop) => {
            if controller.state() != LifecycleState::Quoting {
                println!("not quoting");
                return true;
            }
            controller.dispatch(LifecycleEvent::Stop);
        }
        Ok(QuoteCommand::Status) => print_status(&controller.status()),
        Ok(QuoteCommand::Quit) => return false,
        Err(e) => println!("{}", e),
    }
    true
}

fn report(note: &Notification) {
    match note {
        Notification::StateChanged { from, to } => info!(%from, %to, "State changed"),
        Notification::FeedConnected { price } => println!("feed connected at {}", price),
        Notification::QuotingStarted { buy, sell } => println!("quoting: buy {} / sell {}", buy, sell),
        Notification::QuotingStopped { reason } => println!("quoting stopped: {}", reason),
        Notification::Fatal(message) => println!("FATAL: {}", message),
    }
}
