//! Concurrency-safe index of live orders, keyed by symbol then order id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use super::live_order::LiveOrder;
use crate::domain::order_execution::Order;
use crate::domain::shared::{Exchange, OrderId, Symbol};

type SymbolOrders = HashMap<OrderId, Arc<LiveOrder>>;

/// Orders detached from the queue as one unit: a firing leg and the queued
/// legs of the same base order.
#[derive(Debug)]
pub struct DetachedGroup {
    /// The order that was asked for.
    pub order: Arc<LiveOrder>,
    /// Other legs sharing its base order.
    pub siblings: Vec<Arc<LiveOrder>>,
}

/// Live order index for one exchange and one order class.
///
/// A single read/write lock guards the whole map; sweeps take the read side
/// once to snapshot, mutations are rare.
#[derive(Debug)]
pub struct OrdersQueue {
    exchange: Exchange,
    orders: RwLock<HashMap<Symbol, SymbolOrders>>,
}

impl OrdersQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Exchange this queue tracks.
    #[must_use]
    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Insert or update an order.
    ///
    /// Updating keeps the existing entry (and any claim on it) and replaces
    /// its fields.
    pub fn add(&self, order: Order) -> Arc<LiveOrder> {
        let mut orders = self.orders.write();
        let by_id = orders.entry(order.symbol().clone()).or_default();
        if let Some(existing) = by_id.get(&order.id()) {
            existing.replace(order);
            return Arc::clone(existing);
        }
        let live = Arc::new(LiveOrder::new(order));
        by_id.insert(live.id(), Arc::clone(&live));
        live
    }

    /// Put back entries previously detached.
    pub fn restore(&self, group: DetachedGroup) {
        let mut orders = self.orders.write();
        for live in std::iter::once(group.order).chain(group.siblings) {
            orders
                .entry(live.symbol().clone())
                .or_default()
                .entry(live.id())
                .or_insert(live);
        }
    }

    /// Remove an order. Returns false if it was not queued.
    pub fn remove(&self, symbol: &Symbol, id: OrderId) -> bool {
        self.take(symbol, id).is_some()
    }

    /// Remove and return an order.
    pub fn take(&self, symbol: &Symbol, id: OrderId) -> Option<Arc<LiveOrder>> {
        let mut orders = self.orders.write();
        Self::take_locked(&mut orders, symbol, id)
    }

    /// Atomically remove an order together with every other queued leg of
    /// the same base order.
    ///
    /// Returns `None` if the order is not queued, so of two legs racing to
    /// fire only the first one gets a group.
    pub fn take_with_siblings(&self, symbol: &Symbol, id: OrderId) -> Option<DetachedGroup> {
        let mut orders = self.orders.write();
        let order = Self::take_locked(&mut orders, symbol, id)?;

        let sibling_ids: Vec<OrderId> = orders
            .get(symbol)
            .map(|by_id| {
                by_id
                    .values()
                    .filter(|other| {
                        other.role().is_leg() && other.exec_order_id() == order.exec_order_id()
                    })
                    .map(|other| other.id())
                    .collect()
            })
            .unwrap_or_default();

        let siblings = sibling_ids
            .into_iter()
            .filter_map(|sibling| Self::take_locked(&mut orders, symbol, sibling))
            .collect();

        Some(DetachedGroup { order, siblings })
    }

    /// Set a queued order's price in place. Returns false if not queued.
    pub fn update_price(&self, symbol: &Symbol, id: OrderId, price: Decimal) -> bool {
        let orders = self.orders.read();
        match orders.get(symbol).and_then(|by_id| by_id.get(&id)) {
            Some(live) => {
                live.set_price(price);
                true
            }
            None => false,
        }
    }

    /// Returns true if the order is queued.
    #[must_use]
    pub fn exist(&self, symbol: &Symbol, id: OrderId) -> bool {
        self.orders
            .read()
            .get(symbol)
            .is_some_and(|by_id| by_id.contains_key(&id))
    }

    /// Look up a queued order.
    #[must_use]
    pub fn get(&self, symbol: &Symbol, id: OrderId) -> Option<Arc<LiveOrder>> {
        self.orders
            .read()
            .get(symbol)
            .and_then(|by_id| by_id.get(&id))
            .cloned()
    }

    /// Number of symbols with at least one queued order.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    /// Total number of queued orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.read().values().map(HashMap::len).sum()
    }

    /// All queued orders at this instant.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<LiveOrder>> {
        self.orders
            .read()
            .values()
            .flat_map(|by_id| by_id.values().cloned())
            .collect()
    }

    fn take_locked(
        orders: &mut HashMap<Symbol, SymbolOrders>,
        symbol: &Symbol,
        id: OrderId,
    ) -> Option<Arc<LiveOrder>> {
        let by_id = orders.get_mut(symbol)?;
        let removed = by_id.remove(&id);
        if by_id.is_empty() {
            orders.remove(symbol);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::{
        NewOrder, OrderSide, OrderStatus, OrderType, TpSlRole,
    };
    use crate::domain::shared::{ExchangeOrderId, UserId};
    use rust_decimal_macros::dec;

    fn order(id: i64, symbol: &str, exec: i64, role: TpSlRole) -> Order {
        NewOrder {
            user_id: UserId::new(1),
            exec_order_id: ExchangeOrderId::new(exec),
            symbol: Symbol::new(symbol),
            side: OrderSide::Sell,
            order_type: OrderType::Market,
            quantity: dec!(1),
            price: dec!(100),
            time_in_force: None,
            stop_price: None,
            exchange: Exchange::Binance,
            status: OrderStatus::Active,
            role,
        }
        .into_order(OrderId::new(id))
    }

    #[test]
    fn add_is_idempotent_upsert() {
        let queue = OrdersQueue::new(Exchange::Binance);
        let first = queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));
        let mut updated = order(1, "BTCUSDT", 10, TpSlRole::TakeProfit);
        updated.set_price(dec!(120));
        let second = queue.add(updated);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(queue.order_count(), 1);
        assert_eq!(first.price(), dec!(120));
    }

    #[test]
    fn remove_twice_reports_false() {
        let queue = OrdersQueue::new(Exchange::Binance);
        let symbol = Symbol::new("BTCUSDT");
        queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));

        assert!(queue.remove(&symbol, OrderId::new(1)));
        assert!(!queue.remove(&symbol, OrderId::new(1)));
        assert!(!queue.remove(&Symbol::new("ETHUSDT"), OrderId::new(1)));
    }

    #[test]
    fn update_price_absent_is_noop() {
        let queue = OrdersQueue::new(Exchange::Binance);
        assert!(!queue.update_price(&Symbol::new("BTCUSDT"), OrderId::new(9), dec!(1)));
    }

    #[test]
    fn update_price_present_mutates_in_place() {
        let queue = OrdersQueue::new(Exchange::Binance);
        let live = queue.add(order(3, "BTCUSDT", 10, TpSlRole::StopLoss));

        assert!(queue.update_price(&Symbol::new("BTCUSDT"), OrderId::new(3), dec!(87.5)));
        assert_eq!(live.price(), dec!(87.5));
        assert_eq!(queue.snapshot()[0].price(), dec!(87.5));
    }

    #[test]
    fn len_counts_symbols_not_orders() {
        let queue = OrdersQueue::new(Exchange::Binance);
        assert!(queue.is_empty());
        queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));
        queue.add(order(2, "BTCUSDT", 10, TpSlRole::StopLoss));
        queue.add(order(3, "ETHUSDT", 11, TpSlRole::StopLoss));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.order_count(), 3);
    }

    #[test]
    fn removing_last_order_drops_symbol() {
        let queue = OrdersQueue::new(Exchange::Binance);
        queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));
        queue.remove(&Symbol::new("BTCUSDT"), OrderId::new(1));
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn exist_and_get() {
        let queue = OrdersQueue::new(Exchange::Binance);
        queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));
        let symbol = Symbol::new("BTCUSDT");
        assert!(queue.exist(&symbol, OrderId::new(1)));
        assert!(!queue.exist(&symbol, OrderId::new(2)));
        assert_eq!(queue.get(&symbol, OrderId::new(1)).unwrap().id(), OrderId::new(1));
    }

    #[test]
    fn take_with_siblings_detaches_pair_once() {
        let queue = OrdersQueue::new(Exchange::Binance);
        let symbol = Symbol::new("BTCUSDT");
        queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));
        queue.add(order(2, "BTCUSDT", 10, TpSlRole::StopLoss));
        queue.add(order(3, "BTCUSDT", 99, TpSlRole::StopLoss));

        let group = queue.take_with_siblings(&symbol, OrderId::new(1)).unwrap();
        assert_eq!(group.order.id(), OrderId::new(1));
        assert_eq!(group.siblings.len(), 1);
        assert_eq!(group.siblings[0].id(), OrderId::new(2));

        assert!(queue.take_with_siblings(&symbol, OrderId::new(2)).is_none());
        assert!(queue.exist(&symbol, OrderId::new(3)));
    }

    #[test]
    fn restore_puts_group_back() {
        let queue = OrdersQueue::new(Exchange::Binance);
        let symbol = Symbol::new("BTCUSDT");
        queue.add(order(1, "BTCUSDT", 10, TpSlRole::TakeProfit));
        queue.add(order(2, "BTCUSDT", 10, TpSlRole::StopLoss));

        let group = queue.take_with_siblings(&symbol, OrderId::new(2)).unwrap();
        assert!(queue.is_empty());
        queue.restore(group);
        assert!(queue.exist(&symbol, OrderId::new(1)));
        assert!(queue.exist(&symbol, OrderId::new(2)));
    }

    #[test]
    fn concurrent_adds_and_removes() {
        let queue = Arc::new(OrdersQueue::new(Exchange::Binance));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let id = t * 1000 + i;
                        queue.add(order(id, "BTCUSDT", id, TpSlRole::TakeProfit));
                        if i % 2 == 0 {
                            assert!(queue.remove(&Symbol::new("BTCUSDT"), OrderId::new(id)));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.order_count(), 400);
    }
}
