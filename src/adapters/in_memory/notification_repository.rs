use crate::domain::{BookId, Notification, NotificationId, UserId};
use crate::ports::notification_repository::{
    NotificationRepository as NotificationRepositoryTrait, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;

/// In-memory implementation of NotificationRepository
#[derive(Default)]
pub struct NotificationRepository {
    notifications: Mutex<HashMap<NotificationId, Notification>>,
}

impl NotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored notification, sent or not, oldest first
    pub fn all(&self) -> Result<Vec<Notification>> {
        self.select(|_| true, false, true)
    }

    fn select(
        &self,
        predicate: impl Fn(&Notification) -> bool,
        newest_first: bool,
        include_sent: bool,
    ) -> Result<Vec<Notification>> {
        let mut found: Vec<Notification> = lock(&self.notifications)?
            .values()
            .filter(|n| (include_sent || !n.is_sent) && predicate(n))
            .cloned()
            .collect();
        found.sort_by_key(|n| (n.created_date, n.id));
        if newest_first {
            found.reverse();
        }
        Ok(found)
    }
}

#[async_trait]
impl NotificationRepositoryTrait for NotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<()> {
        lock(&self.notifications)?.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn save(&self, notification: &Notification) -> Result<()> {
        lock(&self.notifications)?.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn get_by_id(&self, notification_id: NotificationId) -> Result<Option<Notification>> {
        Ok(lock(&self.notifications)?.get(&notification_id).cloned())
    }

    async fn delete(&self, notification_id: NotificationId) -> Result<bool> {
        Ok(lock(&self.notifications)?.remove(&notification_id).is_some())
    }

    async fn find_unsent(&self) -> Result<Vec<Notification>> {
        self.select(|_| true, false, false)
    }

    async fn find_unsent_for_user(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.select(|n| n.user_id == user_id, true, false)
    }

    async fn find_unsent_for_book(&self, book_id: BookId) -> Result<Vec<Notification>> {
        self.select(|n| n.book_id == Some(book_id), false, false)
    }
}
