use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{LibraryApplicationError, book, reservation, user};
use crate::domain::{
    BookId, ReservationId, Role, UserId,
    commands::{BorrowBook, CancelReservation, RegisterUser, ReserveBook, ReturnBook, UpdateUser},
};

use super::super::{
    auth::{AdminUser, AuthenticatedUser, Claims},
    error::ApiError,
    extract::{JsonBody, PathParam},
    types::{
        BorrowRequest, BorrowedBookResponse, CreateUserRequest, LoginRequest, LoginResponse,
        RegisterRequest, ReservationResponse, ReserveRequest, ReturnRequest, UpdateUserRequest,
        UserResponse, parse_role,
    },
};
use super::{AppState, validated};

// ============================================================================
// Account
// ============================================================================

/// POST /users/register - アカウント作成（匿名アクセス可）
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let req = validated(req)?;

    let user = user::register(
        &state.service_deps,
        RegisterUser {
            email: req.email,
            name: req.name,
            password: req.password,
            role: Role::User,
            registered_at: Utc::now(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /users/login - トークン発行（匿名アクセス可）
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = user::authenticate(&state.service_deps, &req.email, &req.password).await?;

    let issued_at = Utc::now();
    let lifetime = Duration::hours(state.auth.token_lifetime_hours);
    let claims = Claims::for_user(&user, issued_at, lifetime);

    let token = claims
        .create_token(&state.auth.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_at: issued_at + lifetime,
        user: user.into(),
    }))
}

/// GET /users/me - ログイン中の利用者
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = user::get_user(&state.service_deps, claims.user_id()).await?;
    Ok(Json(user.into()))
}

/// GET /users/borrowed-books - 自分が借りている書籍
pub async fn my_borrowed_books(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<Vec<BorrowedBookResponse>>, ApiError> {
    let borrowed = book::get_user_borrowed_books(&state.service_deps, claims.user_id()).await?;
    Ok(Json(borrowed.into_iter().map(Into::into).collect()))
}

/// GET /users/reservations - 自分の予約
pub async fn my_reservations(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations =
        reservation::get_user_reservations(&state.service_deps, claims.user_id()).await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

// ============================================================================
// Borrow / return / reserve
// ============================================================================

/// POST /users/borrow - 書籍を借りる
///
/// 強制されるビジネスルール:
/// - 書籍が貸出可能、または自分が予約待ちの先頭であること
/// - 貸出日数が1日以上であること
pub async fn borrow(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(req): JsonBody<BorrowRequest>,
) -> Result<(StatusCode, Json<BorrowedBookResponse>), ApiError> {
    let req = validated(req)?;

    let borrowed = book::borrow_book(
        &state.service_deps,
        BorrowBook {
            user_id: claims.user_id(),
            book_id: BookId::from_uuid(req.book_id),
            days: req.days,
            borrowed_at: Utc::now(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(borrowed.into())))
}

/// POST /users/return - 書籍を返却する
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(req): JsonBody<ReturnRequest>,
) -> Result<Json<BorrowedBookResponse>, ApiError> {
    let returned = book::return_book(
        &state.service_deps,
        ReturnBook {
            user_id: claims.user_id(),
            book_id: BookId::from_uuid(req.book_id),
            returned_at: Utc::now(),
        },
    )
    .await?;

    Ok(Json(returned.into()))
}

/// POST /users/reserve - 書籍を予約する
///
/// 貸出可能な書籍は予約できない。`notifyWhenAvailable`が指定されていれば、
/// 失敗しても入荷通知の希望は記録される。
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonBody(req): JsonBody<ReserveRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let reservation = book::reserve_book(
        &state.service_deps,
        ReserveBook {
            user_id: claims.user_id(),
            book_id: BookId::from_uuid(req.book_id),
            notify_when_available: req.notify_when_available,
            reserved_at: Utc::now(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// DELETE /users/reservations/:id - 予約を取り消す
///
/// 本人の予約のみ（管理者は他人の予約も可）。
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(claims): AuthenticatedUser,
    PathParam(reservation_id): PathParam<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let canceled = reservation::cancel_reservation(
        &state.service_deps,
        CancelReservation {
            reservation_id: ReservationId::from_uuid(reservation_id),
            requested_by: claims.user_id(),
            requested_by_admin: claims.is_admin(),
            canceled_at: Utc::now(),
        },
    )
    .await?;

    Ok(Json(canceled.into()))
}

// ============================================================================
// User administration
// ============================================================================

/// GET /users - 利用者一覧（管理者）
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = user::get_all_users(&state.service_deps).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// POST /users - 利用者作成（管理者、ロール指定可）
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let req = validated(req)?;
    let role = parse_role(&req.role)?;

    let user = user::create_user(
        &state.service_deps,
        RegisterUser {
            email: req.email,
            name: req.name,
            password: req.password,
            role,
            registered_at: Utc::now(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /users/:id - 利用者更新（管理者）
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let req = validated(req)?;
    let role = parse_role(&req.role)?;

    let user = user::update_user(
        &state.service_deps,
        UpdateUser {
            user_id: UserId::from_uuid(user_id),
            email: req.email,
            name: req.name,
            role,
        },
    )
    .await?;

    Ok(Json(user.into()))
}

/// DELETE /users/:id - 利用者削除（管理者）
///
/// 自分自身は削除できない。
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    PathParam(user_id): PathParam<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = UserId::from_uuid(user_id);

    if user_id == claims.user_id() {
        return Err(LibraryApplicationError::Forbidden("delete your own account".to_string()).into());
    }

    user::delete_user(&state.service_deps, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
