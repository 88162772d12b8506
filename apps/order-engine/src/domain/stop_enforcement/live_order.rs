//! An order held in a live queue.

use parking_lot::Mutex;
use rust_decimal::Decimal;

use super::claim::{ClaimGuard, EvaluationClaim};
use crate::domain::order_execution::{Order, OrderStatus, TpSlRole};
use crate::domain::shared::{ExchangeOrderId, OrderId, Symbol};

/// Queue entry: the order's mutable fields behind a lock, plus the claim
/// that serialises trigger evaluations.
///
/// The identity fields never change and are readable without locking.
#[derive(Debug)]
pub struct LiveOrder {
    id: OrderId,
    symbol: Symbol,
    exec_order_id: ExchangeOrderId,
    role: TpSlRole,
    state: Mutex<Order>,
    claim: EvaluationClaim,
}

impl LiveOrder {
    /// Wrap an order.
    #[must_use]
    pub fn new(order: Order) -> Self {
        Self {
            id: order.id(),
            symbol: order.symbol().clone(),
            exec_order_id: order.exec_order_id(),
            role: order.role(),
            state: Mutex::new(order),
            claim: EvaluationClaim::new(),
        }
    }

    /// Local id.
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Trading pair.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Exchange id of the base order.
    #[must_use]
    pub const fn exec_order_id(&self) -> ExchangeOrderId {
        self.exec_order_id
    }

    /// Role tag.
    #[must_use]
    pub const fn role(&self) -> TpSlRole {
        self.role
    }

    /// Copy of the current order fields.
    #[must_use]
    pub fn snapshot(&self) -> Order {
        self.state.lock().clone()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.state.lock().status()
    }

    /// Current price.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.state.lock().price()
    }

    /// Overwrite the price in place.
    pub fn set_price(&self, price: Decimal) {
        self.state.lock().set_price(price);
    }

    /// Replace the order fields, keeping identity and claim.
    pub(crate) fn replace(&self, order: Order) {
        *self.state.lock() = order;
    }

    /// Claim this order for one evaluation.
    #[must_use]
    pub fn try_claim(&self) -> Option<ClaimGuard<'_>> {
        self.claim.try_acquire()
    }

    /// Returns true while an evaluation is in flight.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claim.is_held()
    }
}
