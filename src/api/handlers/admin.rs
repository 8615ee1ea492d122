use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

use crate::application::{book, notification, reservation};

use super::super::{
    auth::AdminUser,
    error::ApiError,
    types::{BorrowedBookResponse, NotificationResponse, ReservationResponse, SweepResponse},
};
use super::AppState;

// ============================================================================
// Operational views (GET)
// ============================================================================

/// GET /admin/borrowed-books - 貸出中の一覧
pub async fn borrowed_books(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<BorrowedBookResponse>>, ApiError> {
    let borrowed = book::get_borrowed_books(&state.service_deps).await?;
    Ok(Json(borrowed.into_iter().map(Into::into).collect()))
}

/// GET /admin/reserved-books - 未取消の予約一覧
pub async fn reserved_books(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations = reservation::get_reserved_books(&state.service_deps).await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

/// GET /admin/overdue-books - 延滞中の一覧
pub async fn overdue_books(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<BorrowedBookResponse>>, ApiError> {
    let overdue = book::get_overdue_books(&state.service_deps, Utc::now()).await?;
    Ok(Json(overdue.into_iter().map(Into::into).collect()))
}

/// GET /admin/almost-due-books - 返却期限間近の一覧
pub async fn almost_due_books(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<BorrowedBookResponse>>, ApiError> {
    let almost_due = book::get_almost_due_books(&state.service_deps, Utc::now()).await?;
    Ok(Json(almost_due.into_iter().map(Into::into).collect()))
}

/// GET /admin/unsent-notifications - 未送信通知の一覧
pub async fn unsent_notifications(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let unsent = notification::get_unsent_notifications(&state.service_deps).await?;
    Ok(Json(unsent.into_iter().map(Into::into).collect()))
}

// ============================================================================
// Sweeps (POST) - 外部のスケジューラから呼び出される
// ============================================================================

/// POST /admin/send-notifications - 未送信通知をすべて送信
pub async fn send_notifications(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<SweepResponse>, ApiError> {
    let processed = notification::send_notifications(&state.service_deps, Utc::now()).await?;
    Ok(Json(SweepResponse { processed }))
}

/// POST /admin/detect-overdue - 延滞を検出してOverdueに遷移
pub async fn detect_overdue(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<SweepResponse>, ApiError> {
    let processed = book::detect_overdue_borrows(&state.service_deps, Utc::now()).await?;
    Ok(Json(SweepResponse { processed }))
}

/// POST /admin/release-expired-reservations - 期限切れ予約を解放
pub async fn release_expired_reservations(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<SweepResponse>, ApiError> {
    let processed =
        reservation::release_expired_reservations(&state.service_deps, Utc::now()).await?;
    Ok(Json(SweepResponse { processed }))
}
