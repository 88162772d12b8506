//! Symbol Service
//!
//! Decides which symbols get a market-data stream.

use std::sync::Arc;

use crate::domain::order_execution::{DefaultSymbolRepository, OrderRepository};
use crate::domain::shared::{Exchange, Symbol};
use crate::error::EngineError;

/// Symbol bootstrap queries.
#[derive(Debug)]
pub struct SymbolService<R, D>
where
    R: OrderRepository,
    D: DefaultSymbolRepository,
{
    orders: Arc<R>,
    defaults: Arc<D>,
    configured: Vec<Symbol>,
}

impl<R, D> SymbolService<R, D>
where
    R: OrderRepository,
    D: DefaultSymbolRepository,
{
    /// Create a new service. `configured` is the last-resort symbol list.
    pub const fn new(orders: Arc<R>, defaults: Arc<D>, configured: Vec<Symbol>) -> Self {
        Self {
            orders,
            defaults,
            configured,
        }
    }

    /// Symbols to stream: those with active orders, else the stored
    /// defaults, else the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the store is unreachable.
    pub async fn tracked_symbols(&self, exchange: Exchange) -> Result<Vec<Symbol>, EngineError> {
        let active = self.orders.get_active_symbols(exchange).await?;
        if !active.is_empty() {
            return Ok(active);
        }

        let stored = self.defaults.get_default_symbols().await?;
        if !stored.is_empty() {
            tracing::info!(count = stored.len(), "No active orders, streaming default symbols");
            return Ok(stored);
        }

        tracing::info!(
            count = self.configured.len(),
            "No stored default symbols, streaming configured symbols"
        );
        Ok(self.configured.clone())
    }

    /// Add a symbol to the default store.
    ///
    /// # Errors
    ///
    /// Validation error for a malformed symbol; internal if the store fails.
    pub async fn add_default_symbol(&self, symbol: &Symbol) -> Result<(), EngineError> {
        symbol.validate()?;
        self.defaults.add_symbol(symbol).await?;
        tracing::info!(symbol = %symbol, "Default symbol added");
        Ok(())
    }
}
