use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{LibraryApplicationError, ServiceDependencies, notification};
use crate::domain::{Notification, NotificationId};

use super::super::{
    auth::{AuthenticatedUser, Claims},
    error::ApiError,
    extract::PathParam,
    types::NotificationResponse,
};
use super::AppState;

/// 本人の通知か管理者であることを確認して通知を取得する
async fn owned_notification(
    deps: &ServiceDependencies,
    claims: &Claims,
    notification_id: NotificationId,
    action: &str,
) -> Result<Notification, ApiError> {
    let notification = notification::get_notification(deps, notification_id).await?;

    if notification.user_id != claims.user_id() && !claims.is_admin() {
        return Err(LibraryApplicationError::Forbidden(action.to_string()).into());
    }

    Ok(notification)
}

/// GET /notifications - 自分の未送信通知（新しい順）
pub async fn my_notifications(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications =
        notification::get_user_notifications(&state.service_deps, claims.user_id()).await?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

/// POST /notifications/:id/mark-as-sent - 送信済みにする
pub async fn mark_as_sent(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    PathParam(notification_id): PathParam<Uuid>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification_id = NotificationId::from_uuid(notification_id);
    owned_notification(&state.service_deps, &claims, notification_id, "update this notification")
        .await?;

    let sent =
        notification::mark_notification_as_sent(&state.service_deps, notification_id, Utc::now())
            .await?;

    Ok(Json(sent.into()))
}

/// DELETE /notifications/:id - 通知を削除する
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    PathParam(notification_id): PathParam<Uuid>,
) -> Result<StatusCode, ApiError> {
    let notification_id = NotificationId::from_uuid(notification_id);
    owned_notification(&state.service_deps, &claims, notification_id, "delete this notification")
        .await?;

    notification::delete_notification(&state.service_deps, notification_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
