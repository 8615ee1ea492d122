use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ApplicationUser, Role, UserId};

use super::{error::ApiError, handlers::AppState};

/// JWTのクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 利用者ID
    pub sub: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// 利用者のクレームを作成する
    pub fn for_user(user: &ApplicationUser, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            sub: user.id.value(),
            email: user.email.clone(),
            roles: user.roles.iter().map(|r| r.as_str().to_string()).collect(),
            exp: (issued_at + lifetime).timestamp(),
            iat: issued_at.timestamp(),
        }
    }

    /// トークンを発行する（HS256）
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{EncodingKey, Header, encode};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// トークンを検証してクレームを取り出す（有効期限も検証する）
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{DecodingKey, Validation, decode};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == Role::Admin.as_str())
    }
}

/// 認証済みの利用者（Bearerトークン）
pub struct AuthenticatedUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = Claims::from_token(token, &state.auth.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthenticatedUser(claims))
    }
}

/// 管理者ロールを持つ認証済みの利用者
pub struct AdminUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !claims.is_admin() {
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }

        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> ApplicationUser {
        ApplicationUser::new("a@example.com", "Alice", "hash", role, Utc::now())
    }

    #[test]
    fn test_token_roundtrip() {
        let user = user(Role::Admin);
        let claims = Claims::for_user(&user, Utc::now(), Duration::hours(3));

        let token = claims.create_token("secret").unwrap();
        let decoded = Claims::from_token(&token, "secret").unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id(), user.id);
        assert!(decoded.is_admin());
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let claims = Claims::for_user(&user(Role::User), Utc::now(), Duration::hours(3));
        let token = claims.create_token("secret").unwrap();

        assert!(Claims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - Duration::hours(10);
        let claims = Claims::for_user(&user(Role::User), issued, Duration::hours(3));
        let token = claims.create_token("secret").unwrap();

        assert!(Claims::from_token(&token, "secret").is_err());
    }
}
