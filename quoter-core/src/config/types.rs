use crate::core::TimeInForce;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub instrument: InstrumentConfig,
    pub warmup: WarmupConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

/// External feed process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Executable to spawn
    pub program: String,

    /// Fixed invocation arguments
    pub args: Vec<String>,

    /// Working directory (default: directory of the running executable)
    pub working_dir: Option<PathBuf>,

    /// Pin the reader thread at start
    pub pin_thread: bool,

    /// Core for the reader thread (default: last logical core)
    pub cpu_core: Option<usize>,

    /// Bytes per read from the feed's stdout
    pub read_buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec![
                "-u".to_string(),
                "neon_client.py".to_string(),
                "--instruments".to_string(),
                "EUR/USD".to_string(),
            ],
            working_dir: None,
            pin_thread: true,
            cpu_core: None,
            read_buffer_size: default_read_buffer(),
        }
    }
}

impl FeedConfig {
    /// Configured working directory, else the executable's directory
    pub fn resolved_working_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.working_dir {
            return Some(dir.clone());
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    }
}

/// Traded instrument details supplied by the reference source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Human-readable instrument name, for logs only
    pub name: String,

    /// Minimum price increment
    pub tick_size: Decimal,

    /// Quantity of every quote and warmup order
    pub order_quantity: Decimal,

    pub time_in_force: TimeInForce,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            name: "FCEU".to_string(),
            tick_size: Decimal::new(1, 4),
            order_quantity: Decimal::ONE,
            time_in_force: TimeInForce::GTC,
        }
    }
}

/// Far-off-market distances of the warmup order, in ticks below best bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    pub add_offset_ticks: u32,
    pub update_offset_ticks: u32,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            add_offset_ticks: 50,
            update_offset_ticks: 51,
        }
    }
}

/// Paper venue behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Chance that a repriced quote fills when acknowledged (0.0 - 1.0)
    pub fill_probability: f64,

    /// Delay before each acknowledgment
    pub ack_delay_ms: u64,

    /// Distance of the simulated best bid below the reference, in ticks
    pub half_spread_ticks: u32,

    /// How often the simulated market data is observed
    pub market_data_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fill_probability: 0.0,
            ack_delay_ms: 5,
            half_spread_ticks: 1,
            market_data_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_read_buffer() -> usize {
    4096
}
