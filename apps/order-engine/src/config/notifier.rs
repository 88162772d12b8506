//! User notification and secret settings.

use serde::{Deserialize, Serialize};

use crate::infrastructure::notifier::DEFAULT_TELEGRAM_API_URL;

/// Notifier backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Log only.
    #[default]
    Log,
    /// Telegram bot.
    Telegram,
}

/// Notifier configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Backend.
    #[serde(default)]
    pub kind: NotifierKind,
    /// Bot token, required for `telegram`.
    #[serde(default)]
    pub telegram_token: Option<String>,
    /// Bot API endpoint.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("kind", &self.kind)
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "[REDACTED]"))
            .field("telegram_api_url", &self.telegram_api_url)
            .finish()
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            telegram_token: None,
            telegram_api_url: default_telegram_api_url(),
        }
    }
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

/// Secrets for stored credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// AES key the API secrets are encrypted with (16, 24 or 32 bytes).
    #[serde(default)]
    pub api_key_secret: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key_secret", &"[REDACTED]")
            .finish()
    }
}
