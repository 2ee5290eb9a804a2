//! Warmup order cycle
//!
//! One disposable buy order, priced far below the best bid so it cannot
//! execute, is walked through add → update → delete to prove the order
//! round trip works before any live quote is placed. A cycle is created
//! once per session and never reused.

use crate::config::WarmupConfig;
use crate::core::{OrderKey, OrderRequest, Side, TimeInForce};
use rust_decimal::Decimal;

/// Acknowledgments observed so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupPhase {
    NotSent,
    Sent,
    Added,
    Updated,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct WarmupCycle {
    phase: WarmupPhase,
    key: OrderKey,
    order: OrderRequest,
    update_price: Decimal,
}

impl WarmupCycle {
    /// Price the warmup order off the current best bid
    ///
    /// Returns `None` when there is no usable bid.
    pub fn plan(
        best_bid: Decimal,
        tick_size: Decimal,
        offsets: WarmupConfig,
        quantity: Decimal,
        time_in_force: TimeInForce,
    ) -> Option<Self> {
        if best_bid <= Decimal::ZERO || tick_size <= Decimal::ZERO {
            return None;
        }

        let add_price = best_bid - Decimal::from(offsets.add_offset_ticks) * tick_size;
        let update_price = best_bid - Decimal::from(offsets.update_offset_ticks) * tick_size;

        Some(Self {
            phase: WarmupPhase::NotSent,
            key: OrderKey::NONE,
            order: OrderRequest::add(Side::Buy, add_price, quantity, time_in_force),
            update_price,
        })
    }

    pub fn phase(&self) -> WarmupPhase {
        self.phase
    }

    pub fn key(&self) -> OrderKey {
        self.key
    }

    pub fn add_request(&self) -> OrderRequest {
        self.order
    }

    /// The sink accepted the Add and assigned `key`
    pub fn mark_sent(&mut self, key: OrderKey) {
        if self.phase == WarmupPhase::NotSent {
            self.key = key;
            self.phase = WarmupPhase::Sent;
        }
    }

    /// Added ack; returns the Change to send next
    pub fn on_added(&mut self, key: OrderKey) -> Option<OrderRequest> {
        if self.phase != WarmupPhase::Sent || key != self.key {
            return None;
        }
        self.phase = WarmupPhase::Added;
        self.order = self.order.change(self.key, self.update_price);
        Some(self.order)
    }

    /// Updated ack; returns the Delete to send next
    pub fn on_updated(&mut self, key: OrderKey) -> Option<OrderRequest> {
        if self.phase != WarmupPhase::Added || key != self.key {
            return None;
        }
        self.phase = WarmupPhase::Updated;
        Some(self.order.delete(self.key))
    }

    /// Deleted ack; `true` once the cycle is complete
    pub fn on_deleted(&mut self, key: OrderKey) -> bool {
        if self.phase != WarmupPhase::Updated || key != self.key {
            return false;
        }
        self.phase = WarmupPhase::Deleted;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.phase == WarmupPhase::Deleted
    }

    /// Delete for an order that may still be resting
    ///
    /// `None` once the cycle's own delete has been sent.
    pub fn cancel_request(&self) -> Option<OrderRequest> {
        match self.phase {
            WarmupPhase::Sent | WarmupPhase::Added => Some(self.order.delete(self.key)),
            WarmupPhase::NotSent | WarmupPhase::Updated | WarmupPhase::Deleted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OrderAction;
    use rust_decimal_macros::dec;

    fn cycle() -> WarmupCycle {
        WarmupCycle::plan(
            dec!(1.0850),
            dec!(0.0001),
            WarmupConfig::default(),
            dec!(1),
            TimeInForce::GTC,
        )
        .unwrap()
    }

    #[test]
    fn test_prices_below_best_bid() {
        let c = cycle();
        let add = c.add_request();
        assert_eq!(add.action, OrderAction::Add);
        assert_eq!(add.side, Side::Buy);
        assert_eq!(add.limit_price, dec!(1.0800));
        assert_eq!(c.phase(), WarmupPhase::NotSent);
    }

    #[test]
    fn test_full_round_trip() {
        let mut c = cycle();
        c.mark_sent(OrderKey(42));

        let change = c.on_added(OrderKey(42)).unwrap();
        assert_eq!(change.action, OrderAction::Change);
        assert_eq!(change.key, OrderKey(42));
        assert_eq!(change.limit_price, dec!(1.0799));

        let delete = c.on_updated(OrderKey(42)).unwrap();
        assert_eq!(delete.action, OrderAction::Delete);
        assert_eq!(delete.key, OrderKey(42));

        assert!(c.on_deleted(OrderKey(42)));
        assert!(c.is_complete());
        assert!(c.cancel_request().is_none());
    }

    #[test]
    fn test_ignores_foreign_and_out_of_order_acks() {
        let mut c = cycle();
        c.mark_sent(OrderKey(1));

        assert!(c.on_updated(OrderKey(1)).is_none());
        assert!(!c.on_deleted(OrderKey(1)));
        assert!(c.on_added(OrderKey(2)).is_none());
        assert_eq!(c.phase(), WarmupPhase::Sent);

        assert!(c.on_added(OrderKey(1)).is_some());
        // Duplicate
        assert!(c.on_added(OrderKey(1)).is_none());
        assert_eq!(c.phase(), WarmupPhase::Added);
    }

    #[test]
    fn test_cancel_while_in_flight() {
        let mut c = cycle();
        assert!(c.cancel_request().is_none());

        c.mark_sent(OrderKey(9));
        let cancel = c.cancel_request().unwrap();
        assert_eq!(cancel.action, OrderAction::Delete);
        assert_eq!(cancel.key, OrderKey(9));
    }

    #[test]
    fn test_no_plan_without_bid() {
        let plan = WarmupCycle::plan(
            Decimal::ZERO,
            dec!(0.0001),
            WarmupConfig::default(),
            dec!(1),
            TimeInForce::GTC,
        );
        assert!(plan.is_none());
    }
}
