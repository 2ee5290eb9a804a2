//! CPU Affinity and Thread Priority Utilities
//!
//! The feed reader thread is pinned once, at start, to a fixed logical core
//! to cut scheduling jitter on the read loop. Pinning is a hint: failure is
//! logged at debug and otherwise ignored.

use anyhow::Result;
use core_affinity::CoreId;

/// One-shot CPU pinning hint for the calling thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinityPinner {
    core: usize,
}

impl AffinityPinner {
    pub const fn new(core: usize) -> Self {
        Self { core }
    }

    /// Pinner for the highest-numbered logical core
    ///
    /// `None` if the core list cannot be read on this platform.
    pub fn last_core() -> Option<Self> {
        let cores = core_affinity::get_core_ids()?;
        cores.iter().map(|c| c.id).max().map(Self::new)
    }

    /// Explicit core if given, otherwise the last core
    pub fn for_core(core: Option<usize>) -> Option<Self> {
        match core {
            Some(core) => Some(Self::new(core)),
            None => Self::last_core(),
        }
    }

    pub fn core(&self) -> usize {
        self.core
    }

    /// Pin the current thread; returns whether the OS accepted it
    pub fn pin_current(&self) -> bool {
        let available = core_affinity::get_core_ids()
            .map(|ids| ids.iter().any(|c| c.id == self.core))
            .unwrap_or(false);
        let pinned = available && core_affinity::set_for_current(CoreId { id: self.core });
        if pinned {
            tracing::debug!("Pinned {:?} to CPU core {}", std::thread::current().name(), self.core);
        } else {
            tracing::debug!("CPU pinning to core {} not available, continuing unpinned", self.core);
        }
        pinned
    }
}

/// Set real-time thread priority (Linux only)
///
/// Requires CAP_SYS_NICE capability or root privileges.
///
/// # Safety
/// This uses unsafe libc calls. Use with caution in production.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<()> {
    use libc::{sched_param, sched_setscheduler, SCHED_FIFO};

    unsafe {
        let param = sched_param {
            sched_priority: priority,
        };

        if sched_setscheduler(0, SCHED_FIFO, &param) == 0 {
            tracing::info!("Set thread priority to SCHED_FIFO:{}", priority);
            Ok(())
        } else {
            anyhow::bail!("Failed to set thread priority (may need CAP_SYS_NICE or root)")
        }
    }
}

/// Set real-time thread priority (non-Linux platforms)
///
/// On non-Linux platforms, this is a no-op with a warning.
#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<()> {
    tracing::warn!("Real-time priority setting not supported on this platform");
    Ok(())
}

/// Get the number of available CPU cores
pub fn num_cores() -> usize {
    core_affinity::get_core_ids()
        .map(|ids| ids.len())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_cores() {
        assert!(num_cores() > 0);
    }

    #[test]
    fn test_for_core_prefers_explicit() {
        assert_eq!(AffinityPinner::for_core(Some(3)), Some(AffinityPinner::new(3)));
    }

    #[test]
    fn test_last_core_is_highest() {
        if let Some(pinner) = AffinityPinner::last_core() {
            // Distinct ids, so the largest is at least len - 1
            assert!(pinner.core() >= num_cores() - 1);
        }
    }

    #[test]
    fn test_unknown_core_is_not_fatal() {
        assert!(!AffinityPinner::new(usize::MAX).pin_current());
    }

    #[test]
    fn test_pin_to_last_core() {
        // May fail on macOS or without permissions; must not panic either way
        if let Some(pinner) = AffinityPinner::last_core() {
            let _ = std::thread::spawn(move || pinner.pin_current()).join();
        }
    }
}
