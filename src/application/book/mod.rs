mod borrowing_service;
mod catalog;
mod overdue_detection;
mod queries;

pub use borrowing_service::{borrow_book, reserve_book, return_book};
pub use catalog::{BookPage, MAX_PAGE_SIZE, add_book, delete_book, get_book, get_books, update_book};
pub use overdue_detection::detect_overdue_borrows;
pub use queries::{
    get_almost_due_books, get_borrowed_books, get_overdue_books, get_user_borrowed_books,
};
