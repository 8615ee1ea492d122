mod user_service;

pub use user_service::{
    authenticate, create_user, delete_user, ensure_admin, get_all_users, get_user, register,
    update_user,
};
