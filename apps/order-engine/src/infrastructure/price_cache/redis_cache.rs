//! Redis price cache.
//!
//! Plain `GET`/`SET` on a multiplexed connection. Values never expire.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::application::ports::{CacheError, PriceCachePort};

/// Price cache backed by a Redis server.
#[derive(Clone)]
pub struct RedisPriceCache {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisPriceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPriceCache").finish_non_exhaustive()
    }
}

impl RedisPriceCache {
    /// Connect to `url` (`redis://host:port/db`).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid or the
    /// server is unreachable.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection {
            message: e.to_string(),
        })?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| CacheError::Connection {
                message: e.to_string(),
            })?;
        tracing::info!("Connected to price cache");
        Ok(Self { conn })
    }
}

fn command_error(err: &redis::RedisError) -> CacheError {
    if err.is_connection_dropped() || err.is_io_error() || err.is_timeout() {
        CacheError::Connection {
            message: err.to_string(),
        }
    } else {
        CacheError::Command {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl PriceCachePort for RedisPriceCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut self.conn.clone())
            .await
            .map_err(|e| command_error(&e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut self.conn.clone())
            .await
            .map_err(|e| command_error(&e))
    }
}
