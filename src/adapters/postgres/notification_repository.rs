use crate::domain::{BookId, Notification, NotificationId, UserId};
use crate::ports::notification_repository::{
    NotificationRepository as NotificationRepositoryTrait, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_notification(row: &PgRow) -> Notification {
    let book_id: Option<uuid::Uuid> = row.get("book_id");

    Notification {
        id: NotificationId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: book_id.map(BookId::from_uuid),
        message: row.get("message"),
        is_sent: row.get("is_sent"),
        sent_date: row.get("sent_date"),
        created_date: row.get("created_date"),
    }
}

/// NotificationRepositoryのPostgreSQL実装
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepositoryTrait for NotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, book_id, message, is_sent, sent_date, created_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id.value())
        .bind(notification.user_id.value())
        .bind(notification.book_id.map(|id| id.value()))
        .bind(&notification.message)
        .bind(notification.is_sent)
        .bind(notification.sent_date)
        .bind(notification.created_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notifications SET
                message = $2,
                is_sent = $3,
                sent_date = $4
            WHERE id = $1
            "#,
        )
        .bind(notification.id.value())
        .bind(&notification.message)
        .bind(notification.is_sent)
        .bind(notification.sent_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, notification_id: NotificationId) -> Result<Option<Notification>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, message, is_sent, sent_date, created_date
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(notification_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_notification))
    }

    async fn delete(&self, notification_id: NotificationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_unsent(&self) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, message, is_sent, sent_date, created_date
            FROM notifications
            WHERE NOT is_sent
            ORDER BY created_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_notification).collect())
    }

    async fn find_unsent_for_user(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, message, is_sent, sent_date, created_date
            FROM notifications
            WHERE user_id = $1 AND NOT is_sent
            ORDER BY created_date DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_notification).collect())
    }

    async fn find_unsent_for_book(&self, book_id: BookId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, message, is_sent, sent_date, created_date
            FROM notifications
            WHERE book_id = $1 AND NOT is_sent
            ORDER BY created_date ASC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_notification).collect())
    }
}
