use thiserror::Error;

use crate::domain::{
    BorrowBookError, CancelReservationError, ReserveBookError, ReturnBookError,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// アプリケーション層のエラー
///
/// NotFound系・業務ルール違反・インフラ障害の3種類に分かれる。
/// HTTPステータスへの変換はAPI層で行う。
#[derive(Debug, Error)]
pub enum LibraryApplicationError {
    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 利用者が存在しない
    #[error("User not found")]
    UserNotFound,

    /// 予約が存在しない
    #[error("Reservation not found")]
    ReservationNotFound,

    /// 通知が存在しない
    #[error("Notification not found")]
    NotificationNotFound,

    /// 書籍が貸出不可（貸出中、または他の利用者のために確保されている）
    #[error("Book is not available for borrowing")]
    BookNotAvailableForBorrowing,

    /// 書籍が予約不可（貸出可能な書籍は予約ではなく貸出する）
    #[error("Book is not available for reservation")]
    BookNotAvailableForReservation,

    /// 返却対象の貸出がない
    #[error("Book not found or already returned")]
    BorrowNotFoundOrReturned,

    /// 貸出日数が不正
    #[error("Borrow period must be at least one day")]
    InvalidBorrowPeriod,

    /// 同じ書籍に有効な予約を既に持っている
    #[error("Book is already reserved by this user")]
    AlreadyReserved,

    /// 自分が借りている書籍を予約しようとした
    #[error("Book is already borrowed by this user")]
    AlreadyBorrowing,

    /// 予約は既に取消済み
    #[error("Reservation is already canceled")]
    ReservationAlreadyCanceled,

    /// 貸出中・予約中の書籍は削除できない
    #[error("Book is currently borrowed or reserved")]
    BookInUse,

    /// 未返却の貸出がある利用者は削除できない
    #[error("User has books that are not returned yet")]
    UserHasOpenBorrows,

    /// メールアドレスが登録済み
    #[error("Email is already taken")]
    EmailAlreadyTaken,

    /// メールアドレスまたはパスワードが違う
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 操作の権限がない
    #[error("Not allowed to {0}")]
    Forbidden(String),

    /// ページ指定が不正
    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    /// パスワードハッシュの生成・検証の失敗
    #[error("Password hashing failed: {0}")]
    PasswordHashError(String),

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    BookRepositoryError(#[source] BoxError),

    /// BorrowRepositoryのエラー
    #[error("Borrow repository error")]
    BorrowRepositoryError(#[source] BoxError),

    /// ReservationRepositoryのエラー
    #[error("Reservation repository error")]
    ReservationRepositoryError(#[source] BoxError),

    /// NotificationRepositoryのエラー
    #[error("Notification repository error")]
    NotificationRepositoryError(#[source] BoxError),

    /// UserRepositoryのエラー
    #[error("User repository error")]
    UserRepositoryError(#[source] BoxError),

    /// NotificationChannelのエラー
    #[error("Notification channel error")]
    NotificationChannelError(#[source] BoxError),
}

impl From<BorrowBookError> for LibraryApplicationError {
    fn from(err: BorrowBookError) -> Self {
        match err {
            BorrowBookError::NotAvailable => LibraryApplicationError::BookNotAvailableForBorrowing,
            BorrowBookError::InvalidPeriod => LibraryApplicationError::InvalidBorrowPeriod,
        }
    }
}

impl From<ReturnBookError> for LibraryApplicationError {
    fn from(err: ReturnBookError) -> Self {
        match err {
            ReturnBookError::AlreadyReturned => LibraryApplicationError::BorrowNotFoundOrReturned,
        }
    }
}

impl From<ReserveBookError> for LibraryApplicationError {
    fn from(err: ReserveBookError) -> Self {
        match err {
            ReserveBookError::BookAvailable => {
                LibraryApplicationError::BookNotAvailableForReservation
            }
            ReserveBookError::AlreadyReserved => LibraryApplicationError::AlreadyReserved,
            ReserveBookError::AlreadyBorrowing => LibraryApplicationError::AlreadyBorrowing,
        }
    }
}

impl From<CancelReservationError> for LibraryApplicationError {
    fn from(err: CancelReservationError) -> Self {
        match err {
            CancelReservationError::AlreadyCanceled => {
                LibraryApplicationError::ReservationAlreadyCanceled
            }
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryApplicationError>;
