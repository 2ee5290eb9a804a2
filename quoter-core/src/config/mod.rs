pub mod types;

pub use types::*;

use crate::core::ConfigError;
use rust_decimal::Decimal;
use std::path::Path;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing sections and fields take their defaults. The result is
    /// validated before it is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        let cfg: AppConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a file if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let cfg = Self::default();
                cfg.validate()?;
                Ok(cfg)
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.program.trim().is_empty() {
            return Err(invalid("feed.program", "must not be empty"));
        }

        if self.feed.read_buffer_size == 0 {
            return Err(invalid("feed.read_buffer_size", "must be positive"));
        }

        if self.instrument.tick_size <= Decimal::ZERO {
            return Err(invalid(
                "instrument.tick_size",
                format!("must be positive, got {}", self.instrument.tick_size),
            ));
        }

        if self.instrument.order_quantity <= Decimal::ZERO {
            return Err(invalid(
                "instrument.order_quantity",
                format!("must be positive, got {}", self.instrument.order_quantity),
            ));
        }

        if self.warmup.add_offset_ticks == 0 {
            return Err(invalid("warmup.add_offset_ticks", "must be at least 1"));
        }

        if self.warmup.update_offset_ticks == 0 {
            return Err(invalid("warmup.update_offset_ticks", "must be at least 1"));
        }

        if self.warmup.add_offset_ticks == self.warmup.update_offset_ticks {
            return Err(invalid(
                "warmup.update_offset_ticks",
                "must differ from add_offset_ticks",
            ));
        }

        let p = self.simulation.fill_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid(
                "simulation.fill_probability",
                format!("must be within 0.0..=1.0, got {}", p),
            ));
        }

        if self.simulation.market_data_interval_ms == 0 {
            return Err(invalid("simulation.market_data_interval_ms", "must be positive"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging.level",
                format!(
                    "'{}' is not one of {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
