//! Notifier that writes notifications to the log.

use async_trait::async_trait;

use crate::application::ports::{Notification, NotifierPort, NotifyError};
use crate::domain::shared::UserId;

/// Logs every notification at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotifierPort for TracingNotifier {
    async fn notify(
        &self,
        user_id: UserId,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        match notification {
            Notification::TpSlExecuted { .. } => {
                tracing::info!(user_id = %user_id, "{notification}");
            }
            Notification::TpSlFailed { .. } => {
                tracing::warn!(user_id = %user_id, "{notification}");
            }
        }
        Ok(())
    }
}
