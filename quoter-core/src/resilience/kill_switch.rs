//! Kill Switch - shutdown coordination for the quoting session
//!
//! The orchestration loop polls `should_stop()` and, once set, dispatches
//! the controller's shutdown transition so live quotes are cancelled before
//! the process exits.
//!
//! ## Usage
//!
//! ```no_run
//! use quoter_core::resilience::KillSwitch;
//!
//! let kill_switch = KillSwitch::install();
//!
//! while !kill_switch.should_stop() {
//!     // Handle commands and order events...
//! }
//! ```
//!
//! ## Ctrl+C
//!
//! - First press: graceful shutdown (cancel quotes, stop feed)
//! - Second press: emergency stop (exit without waiting)

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{error, info};

/// Kill switch state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KillSwitchState {
    /// Normal operation
    Running = 0,
    /// Shutting down gracefully
    ShuttingDown = 1,
    /// Emergency stop (immediate)
    EmergencyStop = 2,
}

impl From<u8> for KillSwitchState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::ShuttingDown,
            _ => Self::EmergencyStop,
        }
    }
}

/// Shared shutdown flag
///
/// Clones observe the same state.
#[derive(Clone)]
pub struct KillSwitch {
    state: Arc<AtomicU8>,
    shutdown_reason: Arc<parking_lot::Mutex<Option<String>>>,
    shutdown_time: Arc<parking_lot::Mutex<Option<SystemTime>>>,
}

impl KillSwitch {
    /// Create a new kill switch in Running state
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(KillSwitchState::Running as u8)),
            shutdown_reason: Arc::new(parking_lot::Mutex::new(None)),
            shutdown_time: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Create a kill switch wired to Ctrl+C
    ///
    /// A handler can only be installed once per process; later calls log the
    /// error and return a switch that is only triggered programmatically.
    pub fn install() -> Self {
        let kill_switch = Self::new();
        let handler_switch = kill_switch.clone();

        let installed = ctrlc::set_handler(move || {
            if handler_switch.should_stop() {
                handler_switch.emergency_stop("second Ctrl+C");
            } else {
                handler_switch.shutdown("Ctrl+C received");
            }
        });

        match installed {
            Ok(()) => info!("Ctrl+C handler installed (graceful shutdown, twice to force)"),
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        }

        kill_switch
    }

    /// Check if the session should stop
    #[inline]
    pub fn should_stop(&self) -> bool {
        !matches!(self.state(), KillSwitchState::Running)
    }

    #[inline]
    pub fn is_emergency(&self) -> bool {
        matches!(self.state(), KillSwitchState::EmergencyStop)
    }

    /// Initiate graceful shutdown
    pub fn shutdown(&self, reason: &str) {
        let swapped = self.state.compare_exchange(
            KillSwitchState::Running as u8,
            KillSwitchState::ShuttingDown as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if swapped.is_ok() {
            info!("Kill switch activated: {}", reason);
            self.record(reason.to_string());
        }
    }

    /// Initiate emergency stop (immediate)
    pub fn emergency_stop(&self, reason: &str) {
        error!("EMERGENCY STOP: {}", reason);
        self.state
            .store(KillSwitchState::EmergencyStop as u8, Ordering::Release);
        self.record(format!("EMERGENCY: {}", reason));
    }

    pub fn state(&self) -> KillSwitchState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Reason given by the first trigger
    pub fn shutdown_reason(&self) -> Option<String> {
        self.shutdown_reason.lock().clone()
    }

    pub fn shutdown_time(&self) -> Option<SystemTime> {
        *self.shutdown_time.lock()
    }

    fn record(&self, reason: String) {
        *self.shutdown_reason.lock() = Some(reason);
        *self.shutdown_time.lock() = Some(SystemTime::now());
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}
