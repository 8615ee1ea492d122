use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, MarkSentError, NotificationId, UserId};

/// 通知の状態
///
/// `Pending → Sent`の一方向のみ。削除も終端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Pending,
    Sent,
}

/// 利用者向けの通知メッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub book_id: Option<BookId>,
    pub message: String,
    pub is_sent: bool,
    pub sent_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
}

impl Notification {
    pub fn state(&self) -> NotificationState {
        if self.is_sent {
            NotificationState::Sent
        } else {
            NotificationState::Pending
        }
    }
}

/// 未送信の通知を作成する（純粋関数）
pub fn new_notification(
    user_id: UserId,
    message: impl Into<String>,
    book_id: Option<BookId>,
    created_at: DateTime<Utc>,
) -> Notification {
    Notification {
        id: NotificationId::new(),
        user_id,
        book_id,
        message: message.into(),
        is_sent: false,
        sent_date: None,
        created_date: created_at,
    }
}

/// 送信済みにする（純粋関数）
pub fn mark_sent(
    notification: &Notification,
    sent_at: DateTime<Utc>,
) -> Result<Notification, MarkSentError> {
    if notification.is_sent {
        return Err(MarkSentError::AlreadySent);
    }

    Ok(Notification {
        is_sent: true,
        sent_date: Some(sent_at),
        ..notification.clone()
    })
}

/// ワークフローが発行する通知文
pub mod messages {
    use chrono::{DateTime, Utc};

    pub fn book_returned(title: &str, returned_at: DateTime<Utc>) -> String {
        format!(
            "You have successfully returned the book '{}' on {}.",
            title,
            returned_at.format("%Y-%m-%d")
        )
    }

    pub fn reserved_book_available(title: &str) -> String {
        format!(
            "The book '{}' you reserved is now available. Please visit the library to borrow it.",
            title
        )
    }

    pub fn reservation_canceled(title: &str) -> String {
        format!("Your reservation for the book '{}' has been canceled.", title)
    }

    pub fn reservation_expired(title: &str) -> String {
        format!("Your reservation for the book '{}' has expired.", title)
    }

    pub fn moved_up_in_queue(title: &str) -> String {
        format!(
            "A reservation for the book '{}' has been canceled. Your reservation has moved up in the queue.",
            title
        )
    }

    pub fn notify_when_available(title: &str) -> String {
        format!(
            "You asked to be notified about the book '{}'. It is now available for borrowing.",
            title
        )
    }

    pub fn overdue_reminder(title: &str, due_date: DateTime<Utc>) -> String {
        format!(
            "The book '{}' was due on {}. Please return it as soon as possible.",
            title,
            due_date.format("%Y-%m-%d")
        )
    }
}
