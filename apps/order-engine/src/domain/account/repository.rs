//! API key store.

use async_trait::async_trait;

use super::ApiKeys;
use crate::domain::order_execution::RepositoryError;
use crate::domain::shared::{Exchange, UserId};

/// Read access to stored API keys.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Keys of a user for an exchange.
    async fn find(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<Option<ApiKeys>, RepositoryError>;
}
