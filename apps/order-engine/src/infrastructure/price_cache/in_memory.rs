//! Process-local price cache.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{CacheError, PriceCachePort};

/// Last-write-wins map, for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryPriceCache {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryPriceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a key.
    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

#[async_trait]
impl PriceCachePort for InMemoryPriceCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
