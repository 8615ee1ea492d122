use crate::domain::Notification;
use crate::ports::notification_channel::{NotificationChannel, Result};
use async_trait::async_trait;

/// Notification channel that writes every delivery to the log
///
/// Stands in for a real email/SMS/push gateway.
#[derive(Debug, Default)]
pub struct LoggingChannel;

impl LoggingChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationChannel for LoggingChannel {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            message = %notification.message,
            "Notification delivered"
        );
        Ok(())
    }
}
