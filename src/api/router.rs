use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{AppState, admin, books, notifications, reservations, users};

/// Creates the API router with all library endpoints
///
/// Catalog:
/// - GET /books, GET /books/:id (anonymous)
/// - POST /books, PUT /books/:id, DELETE /books/:id (admin)
///
/// Accounts and the borrow/return/reserve workflow live under /users,
/// operational views and externally triggered sweeps under /admin.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Accounts
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/me", get(users::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        // Borrow / return / reserve
        .route("/users/borrowed-books", get(users::my_borrowed_books))
        .route("/users/reservations", get(users::my_reservations))
        .route("/users/borrow", post(users::borrow))
        .route("/users/return", post(users::return_book))
        .route("/users/reserve", post(users::reserve))
        .route("/users/reservations/:id", delete(users::cancel_reservation))
        // Notifications
        .route("/notifications", get(notifications::my_notifications))
        .route(
            "/notifications/:id/mark-as-sent",
            post(notifications::mark_as_sent),
        )
        .route(
            "/notifications/:id",
            delete(notifications::delete_notification),
        )
        // Reservations (admin)
        .route("/reservations", get(reservations::list_reservations))
        .route(
            "/reservations/active",
            get(reservations::list_active_reservations),
        )
        // Operational views and sweeps (admin)
        .route("/admin/borrowed-books", get(admin::borrowed_books))
        .route("/admin/reserved-books", get(admin::reserved_books))
        .route("/admin/overdue-books", get(admin::overdue_books))
        .route("/admin/almost-due-books", get(admin::almost_due_books))
        .route("/admin/unsent-notifications", get(admin::unsent_notifications))
        .route("/admin/send-notifications", post(admin::send_notifications))
        .route("/admin/detect-overdue", post(admin::detect_overdue))
        .route(
            "/admin/release-expired-reservations",
            post(admin::release_expired_reservations),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // The frontend is served from another origin
        .layer(CorsLayer::permissive())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
