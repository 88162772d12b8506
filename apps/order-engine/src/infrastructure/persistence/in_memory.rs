//! In-memory repositories for testing and development.
//!
//! Transactions take the store lock for their whole lifetime and work on a
//! staged copy that replaces the committed state on `commit`. Dropping a
//! transaction discards the copy.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::account::{ApiKeyRepository, ApiKeys};
use crate::domain::order_execution::{
    DefaultSymbolRepository, NewOrder, Order, OrderRepository, OrderStatus, OrderTransaction,
    RepositoryError, Settings, TpSlRole,
};
use crate::domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol, UserId};

#[derive(Debug, Clone, Default)]
struct StoreState {
    orders: BTreeMap<OrderId, Order>,
    settings: HashMap<OrderId, Settings>,
    next_id: i64,
}

impl StoreState {
    fn insert(&mut self, order: &NewOrder) -> OrderId {
        self.next_id += 1;
        let id = OrderId::new(self.next_id);
        self.orders.insert(id, order.clone().into_order(id));
        id
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut Order, RepositoryError> {
        self.orders.get_mut(&id).ok_or_else(|| not_found(id))
    }

    fn scoped(&self, id: OrderId, symbol: &Symbol, exchange: Exchange) -> Option<Order> {
        self.orders
            .get(&id)
            .filter(|o| o.symbol() == symbol && o.exchange() == exchange)
            .cloned()
    }

    fn legs_of<'a>(&'a self, base: &'a Order) -> impl Iterator<Item = &'a Order> {
        self.orders
            .values()
            .filter(move |o| o.role().is_leg() && same_group(o, base))
    }
}

fn same_group(order: &Order, base: &Order) -> bool {
    order.exec_order_id() == base.exec_order_id()
        && order.symbol() == base.symbol()
        && order.exchange() == base.exchange()
        && order.user_id() == base.user_id()
}

fn not_found(id: OrderId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "order",
        id: id.to_string(),
    }
}

/// In-memory implementation of [`OrderRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<Mutex<StoreState>>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail (for exercising rollback paths).
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Insert an order directly (for test setup).
    pub async fn insert(&self, order: &NewOrder) -> OrderId {
        self.state.lock().await.insert(order)
    }

    /// Committed copy of an order.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.state.lock().await.orders.get(&id).cloned()
    }

    /// Committed copy of every order.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.values().cloned().collect()
    }

    /// Committed settings of a base order.
    pub async fn settings(&self, order_id: OrderId) -> Option<Settings> {
        self.state.lock().await.settings.get(&order_id).cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction {
            guard,
            staged,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        })
    }

    async fn get_order(
        &self,
        id: OrderId,
        symbol: &Symbol,
        exchange: Exchange,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().await.scoped(id, symbol, exchange))
    }

    async fn get_active_symbols(&self, exchange: Exchange) -> Result<Vec<Symbol>, RepositoryError> {
        let state = self.state.lock().await;
        let symbols: BTreeSet<Symbol> = state
            .orders
            .values()
            .filter(|o| o.exchange() == exchange && o.status().is_active())
            .map(|o| o.symbol().clone())
            .collect();
        Ok(symbols.into_iter().collect())
    }

    async fn get_limit_orders(&self, exchange: Exchange) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|o| {
                o.exchange() == exchange
                    && o.role() == TpSlRole::Base
                    && o.order_type().is_resting()
                    && matches!(o.status(), OrderStatus::Active | OrderStatus::PartFilled)
            })
            .cloned()
            .collect())
    }

    async fn get_active_tp_sl_orders(
        &self,
        exchange: Exchange,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.exchange() == exchange && o.role().is_leg() && o.status().is_active())
            .cloned()
            .collect())
    }
}

/// Transaction over [`InMemoryOrderRepository`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
    fail_commit: bool,
}

#[async_trait]
impl OrderTransaction for InMemoryTransaction {
    async fn create_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        Ok(self.staged.insert(order))
    }

    async fn create_order_with_settings(
        &mut self,
        order: &NewOrder,
        settings: &Settings,
    ) -> Result<OrderId, RepositoryError> {
        let id = self.staged.insert(order);
        let mut settings = settings.clone();
        settings.order_id = id;
        self.staged.settings.insert(id, settings);
        Ok(id)
    }

    async fn cancel_order(&mut self, id: OrderId) -> Result<(), RepositoryError> {
        self.staged
            .order_mut(id)?
            .cancel()
            .map_err(|_| not_found(id))
    }

    async fn cancel_orders_by_exchange_id(&mut self, base: &Order) -> Result<u64, RepositoryError> {
        let mut changed = 0;
        for order in self.staged.orders.values_mut() {
            if same_group(order, base) && order.cancel().is_ok() {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn execute_order(
        &mut self,
        id: OrderId,
        fill_order_id: Option<ExchangeOrderId>,
    ) -> Result<(), RepositoryError> {
        self.staged
            .order_mut(id)?
            .fill(fill_order_id)
            .map_err(|_| not_found(id))
    }

    async fn activate_order(&mut self, id: OrderId) -> Result<(), RepositoryError> {
        self.staged
            .order_mut(id)?
            .activate()
            .map_err(|_| not_found(id))
    }

    async fn update_tp_sl(
        &mut self,
        leg_id: OrderId,
        price: Decimal,
        settings: &Settings,
    ) -> Result<(), RepositoryError> {
        self.staged.order_mut(leg_id)?.set_price(price);
        self.staged
            .settings
            .insert(settings.order_id, settings.clone());
        Ok(())
    }

    async fn get_order(
        &mut self,
        id: OrderId,
        symbol: &Symbol,
        exchange: Exchange,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.staged.scoped(id, symbol, exchange))
    }

    async fn get_settings(
        &mut self,
        order_id: OrderId,
    ) -> Result<Option<Settings>, RepositoryError> {
        Ok(self.staged.settings.get(&order_id).cloned())
    }

    async fn get_tp_sl_order_by_base_order(
        &mut self,
        base: &Order,
        role: TpSlRole,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .staged
            .legs_of(base)
            .find(|o| o.role() == role && !o.status().is_terminal())
            .cloned())
    }

    async fn get_tp_sl_orders_by_base_order(
        &mut self,
        base: &Order,
    ) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.staged.legs_of(base).cloned().collect())
    }

    async fn get_opposing_tp_sl_order(
        &mut self,
        order: &Order,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(role) = order.role().opposite() else {
            return Ok(None);
        };
        Ok(self
            .staged
            .legs_of(order)
            .find(|o| o.role() == role && !o.status().is_terminal())
            .cloned())
    }

    async fn commit(mut self) -> Result<(), RepositoryError> {
        if self.fail_commit {
            return Err(RepositoryError::Query("commit rejected".to_string()));
        }
        *self.guard = self.staged;
        Ok(())
    }
}

/// In-memory default-symbol store.
#[derive(Debug, Default)]
pub struct InMemoryDefaultSymbolRepository {
    symbols: parking_lot::RwLock<BTreeSet<Symbol>>,
}

impl InMemoryDefaultSymbolRepository {
    /// Create a store pre-filled with `symbols`.
    #[must_use]
    pub fn with_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            symbols: parking_lot::RwLock::new(symbols.into_iter().collect()),
        }
    }
}

#[async_trait]
impl DefaultSymbolRepository for InMemoryDefaultSymbolRepository {
    async fn get_default_symbols(&self) -> Result<Vec<Symbol>, RepositoryError> {
        Ok(self.symbols.read().iter().cloned().collect())
    }

    async fn add_symbol(&self, symbol: &Symbol) -> Result<(), RepositoryError> {
        self.symbols.write().insert(symbol.clone());
        Ok(())
    }
}

/// In-memory API key store.
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    keys: parking_lot::RwLock<HashMap<(UserId, Exchange), ApiKeys>>,
}

impl InMemoryApiKeyRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store keys, replacing any previous keys of the same user and exchange.
    pub fn add(&self, keys: ApiKeys) {
        self.keys.write().insert((keys.user_id, keys.exchange), keys);
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn find(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<Option<ApiKeys>, RepositoryError> {
        Ok(self.keys.read().get(&(user_id, exchange)).cloned())
    }
}
