use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

use crate::application::reservation;

use super::super::{auth::AdminUser, error::ApiError, types::ReservationResponse};
use super::AppState;

/// GET /reservations - すべての予約（管理者、新しい順）
pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations = reservation::get_all_reservations(&state.service_deps).await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

/// GET /reservations/active - 有効な予約（管理者、待ち行列順）
pub async fn list_active_reservations(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let now = Utc::now();
    let reservations = reservation::get_reserved_books(&state.service_deps).await?;

    Ok(Json(
        reservations
            .into_iter()
            .filter(|r| r.is_active(now))
            .map(Into::into)
            .collect(),
    ))
}
