pub mod book_repository;
pub mod borrow_repository;
pub mod notification_channel;
pub mod notification_repository;
pub mod reservation_repository;
pub mod user_repository;

pub use book_repository::BookRepository;
pub use borrow_repository::BorrowRepository;
pub use notification_channel::NotificationChannel;
pub use notification_repository::NotificationRepository;
pub use reservation_repository::ReservationRepository;
pub use user_repository::UserRepository;
