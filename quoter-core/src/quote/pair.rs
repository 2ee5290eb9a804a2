//! Resting quote state shared between the control path and the feed thread
//!
//! The control path (start, stop, fill, shutdown) arms and disarms sides;
//! the feed thread only reads the live flags and reprices. No locks.
//!
//! Ordering: `arm` writes key and resting price, then sets `live` with
//! Release. A reader that observes `live == true` with Acquire therefore
//! sees the key and price of that arming, and any config published before
//! it.

use crate::core::{OrderKey, Side, Ticks};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Outcome of repricing one side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reprice {
    /// Side is not live; nothing to do
    Idle,
    /// Target equals the resting price; no action
    Unchanged,
    /// Resting price moved; send a Change for this key
    Moved(OrderKey),
}

/// One side of the two-sided quote
#[repr(C, align(64))]
pub struct QuoteSide {
    live: AtomicBool,
    key: AtomicU64,
    resting: AtomicI64,
}

impl QuoteSide {
    pub const fn new() -> Self {
        Self {
            live: AtomicBool::new(false),
            key: AtomicU64::new(OrderKey::NONE.as_u64()),
            resting: AtomicI64::new(0),
        }
    }

    /// Record a freshly added order and make the side live
    pub fn arm(&self, key: OrderKey, resting: Ticks) {
        self.key.store(key.as_u64(), Ordering::Relaxed);
        self.resting.store(resting.0, Ordering::Relaxed);
        self.live.store(true, Ordering::Release);
    }

    /// Take the side out of quoting
    ///
    /// Returns the key to cancel if the side was live. Only one caller can
    /// win the swap, so a side is never cancelled twice.
    pub fn disarm(&self) -> Option<OrderKey> {
        if self.live.swap(false, Ordering::AcqRel) {
            Some(self.key())
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn key(&self) -> OrderKey {
        OrderKey(self.key.load(Ordering::Acquire))
    }

    #[inline(always)]
    pub fn resting(&self) -> Ticks {
        Ticks(self.resting.load(Ordering::Relaxed))
    }

    /// Move the resting price to `target` if it differs
    ///
    /// Single writer: only the feed thread calls this while the side is live.
    #[inline(always)]
    pub fn reprice(&self, target: Ticks) -> Reprice {
        if !self.is_live() {
            return Reprice::Idle;
        }
        if self.resting.swap(target.0, Ordering::Relaxed) == target.0 {
            return Reprice::Unchanged;
        }
        Reprice::Moved(self.key())
    }

    /// Forget the order identity once its deletion is acknowledged
    pub fn clear_key_if(&self, key: OrderKey) -> bool {
        !key.is_none()
            && self
                .key
                .compare_exchange(
                    key.as_u64(),
                    OrderKey::NONE.as_u64(),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
    }
}

impl Default for QuoteSide {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QuoteSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteSide")
            .field("live", &self.is_live())
            .field("key", &self.key())
            .field("resting", &self.resting())
            .finish()
    }
}

/// Buy and sell resting orders
#[derive(Debug, Default)]
pub struct QuotePair {
    pub buy: QuoteSide,
    pub sell: QuoteSide,
}

impl QuotePair {
    pub const fn new() -> Self {
        Self {
            buy: QuoteSide::new(),
            sell: QuoteSide::new(),
        }
    }

    #[inline(always)]
    pub fn side(&self, side: Side) -> &QuoteSide {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    #[inline(always)]
    pub fn both_live(&self) -> bool {
        self.buy.is_live() && self.sell.is_live()
    }

    pub fn any_live(&self) -> bool {
        self.buy.is_live() || self.sell.is_live()
    }

    /// Which side, if any, currently holds `key`
    pub fn side_of(&self, key: OrderKey) -> Option<Side> {
        if key.is_none() {
            return None;
        }
        Side::BOTH.into_iter().find(|&side| self.side(side).key() == key)
    }

    /// Plain copy for status display
    pub fn view(&self) -> QuotePairView {
        QuotePairView {
            buy_live: self.buy.is_live(),
            sell_live: self.sell.is_live(),
            buy_key: self.buy.key(),
            sell_key: self.sell.key(),
            buy_ticks: self.buy.resting(),
            sell_ticks: self.sell.resting(),
        }
    }
}

/// Snapshot of a `QuotePair`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePairView {
    pub buy_live: bool,
    pub sell_live: bool,
    pub buy_key: OrderKey,
    pub sell_key: OrderKey,
    pub buy_ticks: Ticks,
    pub sell_ticks: Ticks,
}
