pub mod book;
pub mod notification;
pub mod reservation;
pub mod user;

mod dependencies;
mod errors;

pub use dependencies::ServiceDependencies;
pub use errors::{LibraryApplicationError, Result};
