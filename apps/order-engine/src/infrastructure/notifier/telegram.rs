//! Telegram Bot API notifier.
//!
//! Users talk to the engine through a Telegram bot, so their user id is also
//! their chat id.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{Notification, NotifierPort, NotifyError};
use crate::domain::shared::UserId;

/// Public Bot API endpoint.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends notifications as bot messages.
pub struct TelegramNotifier {
    client: reqwest::Client,
    send_url: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the URL embeds the bot token
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Create a notifier for bot `token` against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::DeliveryFailed {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            send_url: format!("{}/bot{token}/sendMessage", api_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl NotifierPort for TelegramNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let text = notification.to_string();
        let response = self
            .client
            .post(&self.send_url)
            .json(&SendMessage {
                chat_id: user_id.value(),
                text: &text,
            })
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body: BotResponse = response.json().await.map_err(|e| NotifyError::DeliveryFailed {
            message: format!("HTTP {status}: {}", e.without_url()),
        })?;

        if body.ok {
            Ok(())
        } else {
            Err(NotifyError::DeliveryFailed {
                message: body
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            })
        }
    }
}
