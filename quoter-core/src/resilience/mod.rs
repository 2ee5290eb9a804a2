//! Shutdown coordination
//!
//! - `KillSwitch`: Ctrl+C aware shutdown flag polled by the orchestration loop
//! - `install_panic_handler`: logs panics through tracing before exiting

pub mod kill_switch;
pub mod panic;

pub use kill_switch::{KillSwitch, KillSwitchState};
pub use panic::install_panic_handler;
