//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::{Context, Result};
use clap::Parser;
use quoter_core::config::{AppConfig, FeedConfig};
use quoter_core::lifecycle::{ControllerStatus, OrderLifecycleController};
use quoter_core::{FeedIngester, OrderSink};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

/// Priority used with `--realtime`
const REALTIME_PRIORITY: i32 = 50;

/// Common CLI arguments for the quoting binaries
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CommonArgs {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level; `RUST_LOG` takes precedence
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,

    /// CPU core for the feed reader thread
    #[arg(short = 'c', long)]
    pub cpu_core: Option<usize>,

    /// Instrument tick size
    #[arg(long)]
    pub tick_size: Option<Decimal>,

    /// Feed executable; replaces the configured arguments with `--feed-arg`
    #[arg(long)]
    pub feed_program: Option<String>,

    /// Argument for the feed executable (repeatable)
    #[arg(long = "feed-arg", allow_hyphen_values = true)]
    pub feed_args: Vec<String>,

    /// Enable real-time priority (requires privileges)
    #[arg(long)]
    pub realtime: bool,
}

/// Load the config file and apply CLI overrides
///
/// The merged result is validated again.
pub fn load_config(args: &CommonArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(args.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json = true;
    }
    if let Some(core) = args.cpu_core {
        config.feed.cpu_core = Some(core);
        config.feed.pin_thread = true;
    }
    if let Some(tick_size) = args.tick_size {
        config.instrument.tick_size = tick_size;
    }
    if let Some(program) = &args.feed_program {
        config.feed.program = program.clone();
        config.feed.args = args.feed_args.clone();
    } else if !args.feed_args.is_empty() {
        config.feed.args = args.feed_args.clone();
    }

    config.validate().context("invalid configuration after CLI overrides")?;
    Ok(config)
}

/// Real-time priority for the orchestration thread
///
/// Failure is logged and otherwise ignored.
pub fn setup_performance(realtime: bool) {
    if realtime {
        if let Err(e) = quoter_core::perf::set_realtime_priority(REALTIME_PRIORITY) {
            tracing::warn!("Real-time priority not applied: {}", e);
        }
    }
}

/// Spawn the feed process and hand it to the controller
///
/// A feed that cannot be started is fatal for the session: the controller
/// is aborted, so the sink is closed and `Notification::Fatal` is sent,
/// before the error is returned.
pub fn start_feed<S: OrderSink>(
    controller: &Arc<OrderLifecycleController<S>>,
    config: &FeedConfig,
) -> Result<()> {
    let feed = match FeedIngester::start(config, controller.clone()) {
        Ok(feed) => feed,
        Err(e) => {
            let message = format!("failed to start feed `{}`: {}", config.program, e);
            controller.abort(&message);
            return Err(e).with_context(|| format!("failed to start feed `{}`", config.program));
        }
    };
    tracing::info!(pid = feed.pid(), "Waiting for the first feed price");
    controller.attach_feed(feed);
    Ok(())
}

/// Print final statistics
pub fn print_stats(status: &ControllerStatus) {
    let stats = &status.stats;
    tracing::info!("=== Final Statistics ===");
    tracing::info!("Final state: {}", status.state);
    tracing::info!("Prices received: {}", stats.prices_received);
    tracing::info!("Quote refreshes: {}", stats.quote_refreshes);
    tracing::info!("Changes sent: {}", stats.changes_sent);
    tracing::info!("Changes suppressed: {}", stats.changes_suppressed);
    tracing::info!("Fills: {}", stats.fills_received);

    if stats.quote_refreshes > 0 {
        tracing::info!("Change rate: {:.2}%", stats.change_rate() * 100.0);
    }
}
