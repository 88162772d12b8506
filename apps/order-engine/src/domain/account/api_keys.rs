//! Stored API keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Exchange, UserId};

/// Per-user, per-exchange API keys as stored: the private key and optional
/// passphrase are ciphertext and are only decrypted right before use.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Owner.
    pub user_id: UserId,
    /// Venue the keys belong to.
    pub exchange: Exchange,
    /// Public API key.
    pub pub_key: String,
    /// Encrypted secret key.
    pub priv_key: String,
    /// Encrypted passphrase (KuCoin, OKX).
    pub passphrase: Option<String>,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("user_id", &self.user_id)
            .field("exchange", &self.exchange)
            .field("pub_key", &self.pub_key)
            .field("priv_key", &"[ENCRYPTED]")
            .field(
                "passphrase",
                &self.passphrase.as_ref().map(|_| "[ENCRYPTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_ciphertext() {
        let keys = ApiKeys {
            user_id: UserId::new(1),
            exchange: Exchange::Binance,
            pub_key: "pub".to_string(),
            priv_key: "c2VjcmV0".to_string(),
            passphrase: Some("cGFzcw==".to_string()),
        };
        let debug = format!("{keys:?}");
        assert!(debug.contains("pub"));
        assert!(!debug.contains("c2VjcmV0"));
        assert!(!debug.contains("cGFzcw=="));
    }
}
