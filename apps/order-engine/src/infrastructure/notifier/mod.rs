//! User Notifier Adapters
//!
//! Implementations of [`NotifierPort`](crate::application::ports::NotifierPort).

mod telegram;
mod tracing_notifier;

use async_trait::async_trait;

pub use telegram::{DEFAULT_TELEGRAM_API_URL, TelegramNotifier};
pub use tracing_notifier::TracingNotifier;

use crate::application::ports::{Notification, NotifierPort, NotifyError};
use crate::domain::shared::UserId;

/// Notifier chosen by configuration at startup.
#[derive(Debug)]
pub enum ConfiguredNotifier {
    /// Write notifications to the log.
    Log(TracingNotifier),
    /// Deliver through the Telegram bot.
    Telegram(TelegramNotifier),
}

#[async_trait]
impl NotifierPort for ConfiguredNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        match self {
            Self::Log(notifier) => notifier.notify(user_id, notification).await,
            Self::Telegram(notifier) => notifier.notify(user_id, notification).await,
        }
    }
}
