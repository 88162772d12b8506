//! Credentials Port (Driven Port)
//!
//! Resolves a user's exchange credentials in decrypted form, immediately
//! before an exchange call.

use std::fmt;

use async_trait::async_trait;

use crate::domain::shared::{Exchange, UserId};
use crate::error::EngineError;

/// Decrypted exchange credentials. Never persisted, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// Public API key.
    pub api_key: String,
    /// Secret used to sign requests.
    pub secret_key: String,
    /// Passphrase, for venues that use one.
    pub passphrase: Option<String>,
}

impl ApiCredentials {
    /// Credentials without passphrase.
    #[must_use]
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: None,
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Credential resolution error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialsError {
    /// The user has no keys for the venue.
    #[error("API keys not found for user {user_id} on {exchange}")]
    NotFound {
        /// User.
        user_id: UserId,
        /// Venue.
        exchange: Exchange,
    },

    /// Stored keys could not be decrypted.
    #[error("Failed to decrypt API keys: {message}")]
    Decryption {
        /// Error details.
        message: String,
    },

    /// Key store failure.
    #[error("API key storage error: {message}")]
    Storage {
        /// Error details.
        message: String,
    },
}

impl From<CredentialsError> for EngineError {
    fn from(err: CredentialsError) -> Self {
        match &err {
            CredentialsError::NotFound { .. } => Self::not_found(err.to_string()),
            CredentialsError::Decryption { .. } | CredentialsError::Storage { .. } => {
                Self::internal(err.to_string())
            }
        }
    }
}

/// Port resolving decrypted credentials.
#[async_trait]
pub trait CredentialsPort: Send + Sync {
    /// Credentials of `user_id` for `exchange`.
    async fn resolve(
        &self,
        user_id: UserId,
        exchange: Exchange,
    ) -> Result<ApiCredentials, CredentialsError>;
}

/// Secret decryption error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CipherError {
    /// Ciphertext is not valid base64 or too short.
    #[error("Malformed ciphertext: {message}")]
    Malformed {
        /// Error details.
        message: String,
    },

    /// Key has an unsupported length.
    #[error("Invalid key length {length}, expected 16, 24 or 32 bytes")]
    InvalidKeyLength {
        /// Key length in bytes.
        length: usize,
    },

    /// Plaintext is not UTF-8.
    #[error("Decrypted secret is not valid UTF-8")]
    InvalidUtf8,
}

/// Symmetric decryption of stored secrets.
pub trait SecretCipher: Send + Sync {
    /// Decrypt a stored secret.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}
