//! Lifecycle states and the closed set of events that drive them
//!
//! ```text
//! AwaitingInstrument → AwaitingFeed → WarmupPending
//!   → WarmupInFlight(Add) → WarmupInFlight(Update) → WarmupInFlight(Delete)
//!   → Ready → Quoting ⇄ Stopped
//!
//! any state → Terminated
//! ```

use crate::core::{OrderKey, Side};
use crate::quote::QuoteConfig;
use rust_decimal::Decimal;
use std::fmt;

/// Which acknowledgment the warmup order is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarmupStep {
    Add,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Tick size not yet supplied
    AwaitingInstrument,
    /// No price from the feed yet
    AwaitingFeed,
    /// Waiting for a market observation with a usable best bid
    WarmupPending,
    /// Warmup order sent; waiting for the given acknowledgment
    WarmupInFlight(WarmupStep),
    /// Warmup round trip complete and feed connected
    Ready,
    /// Both sides resting and refreshed on every price
    Quoting,
    /// Quoting halted by the user or a fill; can restart
    Stopped,
    /// Shut down; every further event is ignored
    Terminated,
}

impl LifecycleState {
    /// Compact encoding for lock-free state reads
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::AwaitingInstrument => 0,
            Self::AwaitingFeed => 1,
            Self::WarmupPending => 2,
            Self::WarmupInFlight(WarmupStep::Add) => 3,
            Self::WarmupInFlight(WarmupStep::Update) => 4,
            Self::WarmupInFlight(WarmupStep::Delete) => 5,
            Self::Ready => 6,
            Self::Quoting => 7,
            Self::Stopped => 8,
            Self::Terminated => 9,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::AwaitingInstrument,
            1 => Self::AwaitingFeed,
            2 => Self::WarmupPending,
            3 => Self::WarmupInFlight(WarmupStep::Add),
            4 => Self::WarmupInFlight(WarmupStep::Update),
            5 => Self::WarmupInFlight(WarmupStep::Delete),
            6 => Self::Ready,
            7 => Self::Quoting,
            8 => Self::Stopped,
            9 => Self::Terminated,
            _ => return None,
        })
    }

    /// States in which a start command is accepted
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Ready | Self::Stopped)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingInstrument => write!(f, "AwaitingInstrument"),
            Self::AwaitingFeed => write!(f, "AwaitingFeed"),
            Self::WarmupPending => write!(f, "WarmupPending"),
            Self::WarmupInFlight(step) => write!(f, "WarmupInFlight({:?})", step),
            Self::Ready => write!(f, "Ready"),
            Self::Quoting => write!(f, "Quoting"),
            Self::Stopped => write!(f, "Stopped"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Every input the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleEvent {
    /// Instrument metadata resolved
    InstrumentReady { tick_size: Decimal },
    /// First price from the feed this session
    FeedConnected { price: f64 },
    /// Market data update from the venue
    MarketObserved { best_bid: Option<Decimal> },
    OrderAdded { key: OrderKey },
    OrderUpdated { key: OrderKey },
    OrderDeleted { key: OrderKey },
    OrderFilled { key: OrderKey },
    /// Begin quoting with this configuration
    Start(QuoteConfig),
    Stop,
    Shutdown,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstrumentReady { .. } => "InstrumentReady",
            Self::FeedConnected { .. } => "FeedConnected",
            Self::MarketObserved { .. } => "MarketObserved",
            Self::OrderAdded { .. } => "OrderAdded",
            Self::OrderUpdated { .. } => "OrderUpdated",
            Self::OrderDeleted { .. } => "OrderDeleted",
            Self::OrderFilled { .. } => "OrderFilled",
            Self::Start(_) => "Start",
            Self::Stop => "Stop",
            Self::Shutdown => "Shutdown",
        }
    }
}

/// Why quoting stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// One side was filled; both sides were cancelled
    Filled { side: Side },
    UserRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filled { side } => write!(f, "{} side filled", side),
            Self::UserRequested => write!(f, "stopped by user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LifecycleState; 10] = [
        LifecycleState::AwaitingInstrument,
        LifecycleState::AwaitingFeed,
        LifecycleState::WarmupPending,
        LifecycleState::WarmupInFlight(WarmupStep::Add),
        LifecycleState::WarmupInFlight(WarmupStep::Update),
        LifecycleState::WarmupInFlight(WarmupStep::Delete),
        LifecycleState::Ready,
        LifecycleState::Quoting,
        LifecycleState::Stopped,
        LifecycleState::Terminated,
    ];

    #[test]
    fn test_u8_encoding_is_bijective() {
        for state in ALL {
            assert_eq!(LifecycleState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(LifecycleState::from_u8(200), None);
    }

    #[test]
    fn test_start_allowed_only_when_idle() {
        let startable: Vec<_> = ALL.into_iter().filter(|s| s.can_start()).collect();
        assert_eq!(startable, vec![LifecycleState::Ready, LifecycleState::Stopped]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LifecycleState::WarmupInFlight(WarmupStep::Update).to_string(),
            "WarmupInFlight(Update)"
        );
        assert_eq!(
            StopReason::Filled { side: Side::Sell }.to_string(),
            "SELL side filled"
        );
    }
}
