use crate::domain::{BookId, BorrowedBook, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出記録リポジトリポート
#[async_trait]
pub trait BorrowRepository: Send + Sync {
    /// 新しい貸出記録を保存する
    ///
    /// 同じ(利用者, 書籍)の未返却レコードが既にある場合はエラー。
    async fn insert(&self, borrowed: &BorrowedBook) -> Result<()>;

    /// 貸出記録の状態を保存する
    async fn save(&self, borrowed: &BorrowedBook) -> Result<()>;

    /// 利用者が借りている書籍の未返却レコードを取得する
    async fn find_open(&self, user_id: UserId, book_id: BookId) -> Result<Option<BorrowedBook>>;

    /// 書籍の未返却レコードを取得する（誰が借りているか）
    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<BorrowedBook>>;

    /// すべての未返却レコード（貸出日時の降順）
    async fn find_open_all(&self) -> Result<Vec<BorrowedBook>>;

    /// 利用者の未返却レコード（貸出日時の降順）
    async fn find_open_for_user(&self, user_id: UserId) -> Result<Vec<BorrowedBook>>;

    /// 返却期限が`cutoff`より前の未返却レコード（期限の昇順）
    ///
    /// 延滞一覧と延滞検出バッチで使用される。
    async fn find_open_due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<BorrowedBook>>;

    /// 返却期限が`[from, to)`に入る未返却レコード（期限の昇順）
    async fn find_open_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BorrowedBook>>;
}
