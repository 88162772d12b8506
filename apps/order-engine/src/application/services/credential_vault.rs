//! Credential Vault
//!
//! Resolves decrypted exchange credentials from the API key store. Keys are
//! decrypted per call and never cached in clear text.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{ApiCredentials, CredentialsError, CredentialsPort, SecretCipher};
use crate::domain::account::ApiKeyRepository;
use crate::domain::shared::{Exchange, UserId};

/// [`CredentialsPort`] over an [`ApiKeyRepository`] and a [`SecretCipher`].
#[derive(Debug)]
pub struct CredentialVault<K, S>
where
    K: ApiKeyRepository,
    S: SecretCipher,
{
    keys: Arc<K>,
    cipher: Arc<S>,
}

impl<K, S> CredentialVault<K, S>
where
    K: ApiKeyRepository,
    S: SecretCipher,
{
    /// Create a new vault.
    pub const fn new(keys: Arc<K>, cipher: Arc<S>) -> Self {
        Self { keys, cipher }
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CredentialsError> {
        self.cipher
            .decrypt(ciphertext)
            .map_err(|e| CredentialsError::Decryption {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl<K, S> CredentialsPort for CredentialVault<K, S>
where
    K: ApiKeyRepository + 'static,
    S: SecretCipher + 'static,
{
    async fn resolve(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<ApiCredentials, CredentialsError> {
        let keys = self
            .keys
            .find(user_id, exchange)
            .await
            .map_err(|e| CredentialsError::Storage {
                message: e.to_string(),
            })?
            .ok_or(CredentialsError::NotFound { user_id, exchange })?;

        let secret_key = self.decrypt(&keys.priv_key)?;
        let passphrase = keys
            .passphrase
            .as_deref()
            .map(|p| self.decrypt(p))
            .transpose()?;

        tracing::debug!(user_id = %user_id, exchange = %exchange, "Resolved API credentials");

        Ok(ApiCredentials {
            api_key: keys.pub_key,
            secret_key,
            passphrase,
        })
    }
}
