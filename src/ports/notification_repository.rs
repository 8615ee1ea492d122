use crate::domain::{BookId, Notification, NotificationId, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知リポジトリポート
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 新しい通知を保存する
    async fn insert(&self, notification: &Notification) -> Result<()>;

    /// 通知の状態を保存する
    async fn save(&self, notification: &Notification) -> Result<()>;

    /// IDで通知を取得する
    async fn get_by_id(&self, notification_id: NotificationId) -> Result<Option<Notification>>;

    /// 通知を削除する
    async fn delete(&self, notification_id: NotificationId) -> Result<bool>;

    /// すべての未送信通知（作成日時の昇順）
    async fn find_unsent(&self) -> Result<Vec<Notification>>;

    /// 利用者の未送信通知（作成日時の降順）
    async fn find_unsent_for_user(&self, user_id: UserId) -> Result<Vec<Notification>>;

    /// 書籍に紐づく未送信通知（作成日時の昇順）
    ///
    /// 返却時に「入荷通知」をまとめて送るために使用される。
    async fn find_unsent_for_book(&self, book_id: BookId) -> Result<Vec<Notification>>;
}
