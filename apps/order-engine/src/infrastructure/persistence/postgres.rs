//! `PostgreSQL` repositories.
//!
//! Runtime `sqlx::query` with binds against the schema in
//! `migrations/0001_init.sql`. A [`PgOrderTransaction`] wraps an
//! `sqlx::Transaction`; dropping it without `commit` rolls back.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};

use crate::domain::account::{ApiKeyRepository, ApiKeys};
use crate::domain::order_execution::{
    DefaultSymbolRepository, LegSpec, NewOrder, Order, OrderRepository, OrderSide, OrderStatus,
    OrderTransaction, OrderType, RepositoryError, Settings, TimeInForce, TpSlRole,
};
use crate::domain::shared::{Exchange, ExchangeOrderId, OrderId, Symbol, UserId};

const ORDER_COLUMNS: &str = "id, user_id, exec_order_id, fill_order_id, symbol, side, \
     order_type, quantity, price, time_in_force, stop_price, exchange, status, tp_sl";

const SETTINGS_COLUMNS: &str =
    "order_id, tp_percent, sl_percent, tp_price, sl_price, ts, tp_type, sl_type";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => Self::Serialization(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

/// Shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be reached.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        info!(max_connections, "PostgreSQL connection pool initialized");
        Ok(Self { pool })
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns error if a migration fails.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    /// Close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Order repository over this pool.
    #[must_use]
    pub fn orders(&self) -> PgOrderRepository {
        PgOrderRepository {
            pool: self.pool.clone(),
        }
    }

    /// Default-symbol repository over this pool.
    #[must_use]
    pub fn default_symbols(&self) -> PgDefaultSymbolRepository {
        PgDefaultSymbolRepository {
            pool: self.pool.clone(),
        }
    }

    /// API key repository over this pool.
    #[must_use]
    pub fn api_keys(&self) -> PgApiKeyRepository {
        PgApiKeyRepository {
            pool: self.pool.clone(),
        }
    }
}

/// Order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    type Transaction = PgOrderTransaction;

    async fn begin(&self) -> Result<Self::Transaction, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgOrderTransaction { tx })
    }

    async fn get_order(
        &self,
        id: OrderId,
        symbol: &Symbol,
        exchange: Exchange,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND symbol = $2 AND exchange = $3"
        ))
        .bind(id.value())
        .bind(symbol.as_str())
        .bind(exchange.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn get_active_symbols(&self, exchange: Exchange) -> Result<Vec<Symbol>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT symbol FROM orders WHERE exchange = $1 AND status = $2 ORDER BY symbol",
        )
        .bind(exchange.as_str())
        .bind(OrderStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(symbol_from_row).collect()
    }

    async fn get_limit_orders(&self, exchange: Exchange) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE exchange = $1
               AND tp_sl = $2
               AND order_type IN ($3, $4)
               AND status IN ($5, $6)
             ORDER BY id"
        ))
        .bind(exchange.as_str())
        .bind(TpSlRole::Base.as_str())
        .bind(OrderType::Limit.as_str())
        .bind(OrderType::StopLossLimit.as_str())
        .bind(OrderStatus::Active.as_str())
        .bind(OrderStatus::PartFilled.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn get_active_tp_sl_orders(
        &self,
        exchange: Exchange,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE exchange = $1 AND status = $2 AND tp_sl != $3
             ORDER BY id"
        ))
        .bind(exchange.as_str())
        .bind(OrderStatus::Active.as_str())
        .bind(TpSlRole::Base.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }
}

/// Open transaction on the order store.
pub struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PgOrderTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgOrderTransaction").finish_non_exhaustive()
    }
}

impl PgOrderTransaction {
    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO orders (
                user_id, exec_order_id, symbol, side, order_type, quantity, price,
                time_in_force, stop_price, exchange, status, tp_sl, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            RETURNING id",
        )
        .bind(order.user_id.value())
        .bind(order.exec_order_id.value())
        .bind(order.symbol.as_str())
        .bind(order.side.as_str())
        .bind(order.order_type.as_str())
        .bind(order.quantity)
        .bind(order.price)
        .bind(order.time_in_force.map(|tif| tif.as_str()))
        .bind(order.stop_price)
        .bind(order.exchange.as_str())
        .bind(order.status.as_str())
        .bind(order.role.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        let id = OrderId::new(row.try_get::<i64, _>("id")?);
        debug!(order_id = %id, role = %order.role, "Order inserted");
        Ok(id)
    }

    async fn upsert_settings(
        &mut self,
        order_id: OrderId,
        settings: &Settings,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_settings (
                order_id, tp_percent, sl_percent, tp_price, sl_price, ts, tp_type, sl_type, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (order_id) DO UPDATE SET
                tp_percent = EXCLUDED.tp_percent,
                sl_percent = EXCLUDED.sl_percent,
                tp_price = EXCLUDED.tp_price,
                sl_price = EXCLUDED.sl_price,
                ts = EXCLUDED.ts,
                tp_type = EXCLUDED.tp_type,
                sl_type = EXCLUDED.sl_type",
        )
        .bind(order_id.value())
        .bind(settings.take_profit.percent)
        .bind(settings.stop_loss.percent)
        .bind(settings.take_profit.price)
        .bind(settings.stop_loss.price)
        .bind(settings.trailing_stop)
        .bind(settings.take_profit.order_type.map(|t| t.as_str()))
        .bind(settings.stop_loss.order_type.map(|t| t.as_str()))
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        from: &[OrderStatus],
    ) -> Result<(), RepositoryError> {
        let from: Vec<&str> = from.iter().map(OrderStatus::as_str).collect();
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = ANY($3)")
            .bind(status.as_str())
            .bind(id.value())
            .bind(from)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

const OPEN_STATUSES: [OrderStatus; 3] = [
    OrderStatus::Inactive,
    OrderStatus::Active,
    OrderStatus::PartFilled,
];

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn create_order(&mut self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        self.insert_order(order).await
    }

    async fn create_order_with_settings(
        &mut self,
        order: &NewOrder,
        settings: &Settings,
    ) -> Result<OrderId, RepositoryError> {
        let id = self.insert_order(order).await?;
        self.upsert_settings(id, settings).await?;
        Ok(id)
    }

    async fn cancel_order(&mut self, id: OrderId) -> Result<(), RepositoryError> {
        self.set_status(id, OrderStatus::Canceled, &OPEN_STATUSES)
            .await
    }

    async fn cancel_orders_by_exchange_id(&mut self, base: &Order) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1
             WHERE exec_order_id = $2 AND symbol = $3 AND exchange = $4 AND user_id = $5
               AND status NOT IN ($6, $7)",
        )
        .bind(OrderStatus::Canceled.as_str())
        .bind(base.exec_order_id().value())
        .bind(base.symbol().as_str())
        .bind(base.exchange().as_str())
        .bind(base.user_id().value())
        .bind(OrderStatus::Filled.as_str())
        .bind(OrderStatus::Canceled.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn execute_order(
        &mut self,
        id: OrderId,
        fill_order_id: Option<ExchangeOrderId>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, fill_order_id = COALESCE($2, fill_order_id)
             WHERE id = $3 AND status NOT IN ($4, $5)",
        )
        .bind(OrderStatus::Filled.as_str())
        .bind(fill_order_id.map(ExchangeOrderId::value))
        .bind(id.value())
        .bind(OrderStatus::Filled.as_str())
        .bind(OrderStatus::Canceled.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn activate_order(&mut self, id: OrderId) -> Result<(), RepositoryError> {
        self.set_status(id, OrderStatus::Active, &[OrderStatus::Inactive])
            .await
    }

    async fn update_tp_sl(
        &mut self,
        leg_id: OrderId,
        price: Decimal,
        settings: &Settings,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET price = $1 WHERE id = $2")
            .bind(price)
            .bind(leg_id.value())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(leg_id));
        }
        self.upsert_settings(settings.order_id, settings).await
    }

    async fn get_order(
        &mut self,
        id: OrderId,
        symbol: &Symbol,
        exchange: Exchange,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE id = $1 AND symbol = $2 AND exchange = $3
             FOR UPDATE"
        ))
        .bind(id.value())
        .bind(symbol.as_str())
        .bind(exchange.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn get_settings(
        &mut self,
        order_id: OrderId,
    ) -> Result<Option<Settings>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM order_settings WHERE order_id = $1"
        ))
        .bind(order_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(settings_from_row).transpose()
    }

    async fn get_tp_sl_order_by_base_order(
        &mut self,
        base: &Order,
        role: TpSlRole,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE exec_order_id = $1 AND symbol = $2 AND exchange = $3 AND user_id = $4
               AND tp_sl = $5 AND status NOT IN ($6, $7)
             ORDER BY id
             LIMIT 1
             FOR UPDATE"
        ))
        .bind(base.exec_order_id().value())
        .bind(base.symbol().as_str())
        .bind(base.exchange().as_str())
        .bind(base.user_id().value())
        .bind(role.as_str())
        .bind(OrderStatus::Filled.as_str())
        .bind(OrderStatus::Canceled.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn get_tp_sl_orders_by_base_order(
        &mut self,
        base: &Order,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE exec_order_id = $1 AND symbol = $2 AND exchange = $3 AND user_id = $4
               AND tp_sl != $5
             ORDER BY id
             FOR UPDATE"
        ))
        .bind(base.exec_order_id().value())
        .bind(base.symbol().as_str())
        .bind(base.exchange().as_str())
        .bind(base.user_id().value())
        .bind(TpSlRole::Base.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn get_opposing_tp_sl_order(
        &mut self,
        order: &Order,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(opposite) = order.role().opposite() else {
            return Ok(None);
        };
        self.get_tp_sl_order_by_base_order(order, opposite).await
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Default-symbol repository.
#[derive(Debug, Clone)]
pub struct PgDefaultSymbolRepository {
    pool: PgPool,
}

#[async_trait]
impl DefaultSymbolRepository for PgDefaultSymbolRepository {
    async fn get_default_symbols(&self) -> Result<Vec<Symbol>, RepositoryError> {
        let rows = sqlx::query("SELECT symbol FROM default_symbols ORDER BY symbol")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(symbol_from_row).collect()
    }

    async fn add_symbol(&self, symbol: &Symbol) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO default_symbols (symbol, created_at) VALUES ($1, NOW())
             ON CONFLICT (symbol) DO NOTHING",
        )
        .bind(symbol.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// API key repository.
#[derive(Debug, Clone)]
pub struct PgApiKeyRepository {
    pool: PgPool,
}

#[async_trait]
impl ApiKeyRepository for PgApiKeyRepository {
    async fn find(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<Option<ApiKeys>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, exchange, pub_key, priv_key, passphrase FROM api_keys
             WHERE user_id = $1 AND exchange = $2",
        )
        .bind(user_id.value())
        .bind(exchange.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<ApiKeys, RepositoryError> {
            Ok(ApiKeys {
                user_id: UserId::new(row.try_get("user_id")?),
                exchange: parse_column(&row, "exchange")?,
                pub_key: row.try_get("pub_key")?,
                priv_key: row.try_get("priv_key")?,
                passphrase: row
                    .try_get::<Option<String>, _>("passphrase")?
                    .filter(|p| !p.is_empty()),
            })
        })
        .transpose()
    }
}

fn not_found(id: OrderId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "order",
        id: id.to_string(),
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    parse_stored(column, &raw)
}

fn parse_stored<T>(column: &str, raw: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| RepositoryError::Serialization(format!("{column}: {e}")))
}

fn optional_column<T>(row: &PgRow, column: &str) -> Result<Option<T>, RepositoryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    row.try_get::<Option<String>, _>(column)?
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_stored(column, &raw))
        .transpose()
}

fn symbol_from_row(row: &PgRow) -> Result<Symbol, RepositoryError> {
    Ok(Symbol::new(row.try_get::<String, _>("symbol")?))
}

fn order_from_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let params = NewOrder {
        user_id: UserId::new(row.try_get("user_id")?),
        exec_order_id: ExchangeOrderId::new(row.try_get("exec_order_id")?),
        symbol: Symbol::new(row.try_get::<String, _>("symbol")?),
        side: parse_column::<OrderSide>(row, "side")?,
        order_type: parse_column::<OrderType>(row, "order_type")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        time_in_force: optional_column::<TimeInForce>(row, "time_in_force")?,
        stop_price: row.try_get("stop_price")?,
        exchange: parse_column::<Exchange>(row, "exchange")?,
        status: parse_column::<OrderStatus>(row, "status")?,
        role: parse_column::<TpSlRole>(row, "tp_sl")?,
    };
    let fill_order_id = row
        .try_get::<Option<i64>, _>("fill_order_id")?
        .map(ExchangeOrderId::new);

    Ok(Order::restore(
        OrderId::new(row.try_get("id")?),
        params,
        fill_order_id,
    ))
}

fn settings_from_row(row: &PgRow) -> Result<Settings, RepositoryError> {
    Ok(Settings {
        order_id: OrderId::new(row.try_get("order_id")?),
        take_profit: LegSpec {
            percent: row.try_get("tp_percent")?,
            price: row.try_get("tp_price")?,
            order_type: optional_column::<OrderType>(row, "tp_type")?,
        },
        stop_loss: LegSpec {
            percent: row.try_get("sl_percent")?,
            price: row.try_get("sl_price")?,
            order_type: optional_column::<OrderType>(row, "sl_type")?,
        },
        trailing_stop: row.try_get("ts")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_connection_errors() {
        let err: RepositoryError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, RepositoryError::Connection(_)));
    }

    #[test]
    fn missing_rows_are_query_errors() {
        let err: RepositoryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[test]
    fn decode_errors_are_serialization_errors() {
        let err: RepositoryError = sqlx::Error::ColumnNotFound("price".into()).into();
        assert!(matches!(err, RepositoryError::Serialization(_)));
    }

    #[test]
    fn stored_names_parse_back() {
        assert_eq!(
            parse_stored::<OrderStatus>("status", "part_filled").unwrap(),
            OrderStatus::PartFilled
        );
        assert_eq!(
            parse_stored::<TpSlRole>("tp_sl", "sl").unwrap(),
            TpSlRole::StopLoss
        );
        assert_eq!(
            parse_stored::<OrderType>("order_type", "STOP_LOSS_LIMIT").unwrap(),
            OrderType::StopLossLimit
        );
    }

    #[test]
    fn unknown_stored_name_is_serialization_error() {
        let err = parse_stored::<OrderStatus>("status", "expired").unwrap_err();
        assert!(matches!(err, RepositoryError::Serialization(ref m) if m.starts_with("status:")));
    }

    #[test]
    fn every_order_column_is_selected() {
        for column in [
            "fill_order_id",
            "time_in_force",
            "stop_price",
            "tp_sl",
        ] {
            assert!(ORDER_COLUMNS.contains(column), "{column}");
        }
    }
}
