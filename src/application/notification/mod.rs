mod notification_service;

pub use notification_service::{
    create_notification, delete_notification, get_notification, get_unsent_notifications,
    get_user_notifications, mark_notification_as_sent, send_notification, send_notifications,
    send_unsent_for_book,
};
