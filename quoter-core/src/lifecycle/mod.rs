//! Order lifecycle: bootstrap, warmup round trip, quoting, unwind, shutdown
//!
//! - `state`: states, events and stop reasons
//! - `warmup`: the disposable add → update → delete order cycle
//! - `controller`: the state machine and the hot-path price listener
//! - `notify`: status notifications for presentation layers

pub mod controller;
pub mod notify;
pub mod state;
pub mod warmup;

pub use controller::{ControllerSettings, ControllerStatus, OrderLifecycleController};
pub use notify::{Notification, Notifier};
pub use state::{LifecycleEvent, LifecycleState, StopReason, WarmupStep};
pub use warmup::{WarmupCycle, WarmupPhase};
