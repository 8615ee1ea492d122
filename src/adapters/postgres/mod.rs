pub mod book_repository;
pub mod borrow_repository;
pub mod notification_repository;
pub mod reservation_repository;
pub mod user_repository;

// パブリックに型を再エクスポート
pub use book_repository::BookRepository as PostgresBookRepository;
pub use borrow_repository::BorrowRepository as PostgresBorrowRepository;
pub use notification_repository::NotificationRepository as PostgresNotificationRepository;
pub use reservation_repository::ReservationRepository as PostgresReservationRepository;
pub use user_repository::UserRepository as PostgresUserRepository;

/// 行データの変換エラー
fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}
