use crate::domain::{Notification, UserId};
use crate::ports::notification_channel::{NotificationChannel, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock implementation of NotificationChannel
///
/// Records every delivered notification instead of sending it.
/// Can be switched to fail so callers' error paths can be exercised.
#[derive(Default)]
pub struct RecordingChannel {
    delivered: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of delivered notifications, in delivery order
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Messages delivered to one user, in delivery order
    pub fn messages_for(&self, user_id: UserId) -> Vec<String> {
        self.delivered()
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.message)
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("notification channel unavailable".into());
        }
        self.delivered
            .lock()
            .map_err(|_| "recording channel lock poisoned")?
            .push(notification.clone());
        Ok(())
    }
}
