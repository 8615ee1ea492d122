use crate::domain::{BookId, Reservation, ReservationId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約リポジトリポート
///
/// 書籍ごとの予約待ち行列の読み出しもここで行う。
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 新しい予約を保存する
    async fn insert(&self, reservation: &Reservation) -> Result<()>;

    /// 予約の状態を保存する
    async fn save(&self, reservation: &Reservation) -> Result<()>;

    /// IDで予約を取得する
    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>>;

    /// 予約を削除する
    async fn delete(&self, reservation_id: ReservationId) -> Result<bool>;

    /// すべての予約（予約日時の降順）
    async fn find_all(&self) -> Result<Vec<Reservation>>;

    /// 取消されていない予約（予約日時の昇順）
    async fn find_not_canceled(&self) -> Result<Vec<Reservation>>;

    /// 利用者の予約（予約日時の降順）
    async fn find_for_user(&self, user_id: UserId) -> Result<Vec<Reservation>>;

    /// 利用者が書籍に持っている未取消の予約
    async fn find_by_user_and_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Reservation>>;

    /// 書籍の予約待ち行列の先頭
    ///
    /// 有効（未取消かつ期限内）な予約のうち予約日時が最も古いもの。
    /// `excluding`に指定された予約は除外する。
    async fn find_next_active(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
        excluding: Option<ReservationId>,
    ) -> Result<Option<Reservation>>;
}
