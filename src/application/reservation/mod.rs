mod reservation_service;

pub(crate) use reservation_service::release_expired;
pub use reservation_service::{
    QueueAdvance, add_reservation, cancel_reservation, delete_reservation, get_all_reservations,
    get_reservation, get_reservation_by_user_by_book, get_reserved_books, get_user_reservations,
    promote_next_in_queue, release_expired_reservations, update_reservation,
};
