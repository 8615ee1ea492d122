//! In-memory implementations of the repository ports
//!
//! Used by the integration tests and for running the API without a database.

pub mod book_repository;
pub mod borrow_repository;
pub mod notification_repository;
pub mod reservation_repository;
pub mod user_repository;

pub use book_repository::BookRepository as InMemoryBookRepository;
pub use borrow_repository::BorrowRepository as InMemoryBorrowRepository;
pub use notification_repository::NotificationRepository as InMemoryNotificationRepository;
pub use reservation_repository::ReservationRepository as InMemoryReservationRepository;
pub use user_repository::UserRepository as InMemoryUserRepository;

use std::sync::{Mutex, MutexGuard};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lock the store, turning a poisoned mutex into an error
fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BoxError> {
    mutex
        .lock()
        .map_err(|_| BoxError::from("in-memory store lock poisoned"))
}
