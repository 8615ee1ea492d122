pub mod book;
pub mod borrowing;
pub mod commands;
pub mod errors;
pub mod notification;
pub mod reservation;
pub mod user;
pub mod value_objects;

pub use book::{Book, BookDetails};
pub use borrowing::{BorrowStatus, BorrowedBook};
pub use errors::*;
pub use notification::{Notification, NotificationState};
pub use reservation::Reservation;
pub use user::{ApplicationUser, Role};
pub use value_objects::*;
