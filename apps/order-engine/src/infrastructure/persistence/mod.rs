//! Persistence Adapters
//!
//! `PostgreSQL` repositories for production and in-memory repositories for
//! tests and local runs.

mod in_memory;
mod postgres;

pub use in_memory::{
    InMemoryApiKeyRepository, InMemoryDefaultSymbolRepository, InMemoryOrderRepository,
    InMemoryTransaction,
};
pub use postgres::{
    PgApiKeyRepository, PgDefaultSymbolRepository, PgOrderRepository, PgOrderTransaction, PgStore,
};
