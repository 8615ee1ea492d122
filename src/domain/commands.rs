use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, ReservationId, Role, UserId};

/// コマンド：書籍を借りる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub user_id: UserId,
    pub book_id: BookId,
    pub days: i64,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub user_id: UserId,
    pub book_id: BookId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：書籍を予約する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveBook {
    pub user_id: UserId,
    pub book_id: BookId,
    /// 予約できなかった場合に「入荷通知」を残すか
    pub notify_when_available: bool,
    pub reserved_at: DateTime<Utc>,
}

/// コマンド：予約を取り消す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReservation {
    pub reservation_id: ReservationId,
    pub requested_by: UserId,
    /// 管理者は他人の予約も取り消せる
    pub requested_by_admin: bool,
    pub canceled_at: DateTime<Utc>,
}

/// コマンド：通知を作成する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: UserId,
    pub message: String,
    pub book_id: Option<BookId>,
    pub send_immediately: bool,
    pub created_at: DateTime<Utc>,
}

/// コマンド：利用者を登録する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

/// コマンド：利用者情報を更新する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUser {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}
