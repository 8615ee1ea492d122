pub mod admin;
pub mod books;
pub mod notifications;
pub mod reservations;
pub mod users;

use crate::application::ServiceDependencies;
use crate::config::AuthConfig;

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub auth: AuthConfig,
}

/// リクエストボディを検証する
pub(super) fn validated<T: validator::Validate>(request: T) -> Result<T, super::ApiError> {
    request.validate()?;
    Ok(request)
}
