use crate::application::LibraryApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーと、認証・入力検証のエラーをまとめ、
/// HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// アプリケーション層のエラー
    Application(LibraryApplicationError),
    /// トークンがない、または不正
    Unauthorized(String),
    /// ロールが足りない
    Forbidden(String),
    /// リクエストボディ・パラメータの検証エラー
    Validation(String),
    /// API層で発生したシステム障害（トークン署名など）
    Internal(String),
}

impl From<LibraryApplicationError> for ApiError {
    fn from(err: LibraryApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

fn application_status(err: &LibraryApplicationError) -> StatusCode {
    use LibraryApplicationError::*;

    match err {
        // 404 Not Found - リクエストされたリソースが存在しない
        BookNotFound | UserNotFound | ReservationNotFound | NotificationNotFound => {
            StatusCode::NOT_FOUND
        }

        // 400 Bad Request - ビジネスルール違反
        BookNotAvailableForBorrowing
        | BookNotAvailableForReservation
        | BorrowNotFoundOrReturned
        | InvalidBorrowPeriod
        | AlreadyReserved
        | AlreadyBorrowing
        | ReservationAlreadyCanceled
        | BookInUse
        | UserHasOpenBorrows
        | EmailAlreadyTaken
        | InvalidPage(_) => StatusCode::BAD_REQUEST,

        // 401 / 403
        InvalidCredentials => StatusCode::UNAUTHORIZED,
        Forbidden(_) => StatusCode::FORBIDDEN,

        // 500 Internal Server Error - システム障害
        PasswordHashError(_)
        | BookRepositoryError(_)
        | BorrowRepositoryError(_)
        | ReservationRepositoryError(_)
        | NotificationRepositoryError(_)
        | UserRepositoryError(_)
        | NotificationChannelError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Application(err) => {
                let status = application_status(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                    match std::error::Error::source(&err) {
                        Some(source) => tracing::error!("{}: {}", err, source),
                        None => tracing::error!("{}", err),
                    }
                    (status, "An unexpected error occurred".to_string())
                } else {
                    (status, err.to_string())
                }
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            application_status(&LibraryApplicationError::BookNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            application_status(&LibraryApplicationError::BorrowNotFoundOrReturned),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            application_status(&LibraryApplicationError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            application_status(&LibraryApplicationError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            application_status(&LibraryApplicationError::BookRepositoryError("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
