use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};

use crate::domain::{
    ApplicationUser, Role, UserId,
    commands::{RegisterUser, UpdateUser},
};

use crate::application::{LibraryApplicationError, Result, ServiceDependencies};

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LibraryApplicationError::PasswordHashError(e.to_string()))
}

fn verify_password(hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| LibraryApplicationError::PasswordHashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_by_email(deps: &ServiceDependencies, email: &str) -> Result<Option<ApplicationUser>> {
    deps.user_repository
        .find_by_email(email)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)
}

/// 利用者を登録する（一般利用者として）
pub async fn register(deps: &ServiceDependencies, cmd: RegisterUser) -> Result<ApplicationUser> {
    create_user(
        deps,
        RegisterUser {
            role: Role::User,
            ..cmd
        },
    )
    .await
}

/// 利用者を作成する（管理者向け、ロールを指定できる）
///
/// ビジネスルール：
/// - メールアドレスは一意
/// - パスワードはargon2でハッシュ化して保存する
pub async fn create_user(deps: &ServiceDependencies, cmd: RegisterUser) -> Result<ApplicationUser> {
    let email = normalize_email(&cmd.email);

    if find_by_email(deps, &email).await?.is_some() {
        return Err(LibraryApplicationError::EmailAlreadyTaken);
    }

    let password_hash = hash_password(&cmd.password)?;
    let user = ApplicationUser::new(email, cmd.name, password_hash, cmd.role, cmd.registered_at);

    deps.user_repository
        .insert(&user)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    tracing::info!(user_id = %user.id, role = cmd.role.as_str(), "User registered");

    Ok(user)
}

/// メールアドレスとパスワードで認証する
///
/// 利用者が存在しない場合もパスワード不一致と同じエラーを返す。
pub async fn authenticate(
    deps: &ServiceDependencies,
    email: &str,
    password: &str,
) -> Result<ApplicationUser> {
    let user = find_by_email(deps, &normalize_email(email))
        .await?
        .ok_or(LibraryApplicationError::InvalidCredentials)?;

    if !verify_password(&user.password_hash, password)? {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(LibraryApplicationError::InvalidCredentials);
    }

    Ok(user)
}

pub async fn get_user(deps: &ServiceDependencies, user_id: UserId) -> Result<ApplicationUser> {
    deps.user_repository
        .get_by_id(user_id)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)
}

pub async fn get_all_users(deps: &ServiceDependencies) -> Result<Vec<ApplicationUser>> {
    deps.user_repository
        .find_all()
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)
}

/// 利用者情報を更新する
///
/// メールアドレスを変更する場合は他の利用者と重複しないこと。
/// ユーザー名はメールアドレスに追従する。
pub async fn update_user(deps: &ServiceDependencies, cmd: UpdateUser) -> Result<ApplicationUser> {
    let user = get_user(deps, cmd.user_id).await?;
    let email = normalize_email(&cmd.email);

    if email != user.email {
        if let Some(other) = find_by_email(deps, &email).await? {
            if other.id != user.id {
                return Err(LibraryApplicationError::EmailAlreadyTaken);
            }
        }
    }

    let updated = ApplicationUser {
        user_name: email.clone(),
        email,
        name: cmd.name,
        roles: vec![cmd.role],
        ..user
    };

    deps.user_repository
        .save(&updated)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    tracing::info!(user_id = %updated.id, "User updated");

    Ok(updated)
}

/// 利用者を削除する
///
/// 未返却の貸出がある利用者は削除できない。
pub async fn delete_user(deps: &ServiceDependencies, user_id: UserId) -> Result<()> {
    let open_borrows = deps
        .borrow_repository
        .find_open_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?;

    if !open_borrows.is_empty() {
        return Err(LibraryApplicationError::UserHasOpenBorrows);
    }

    let deleted = deps
        .user_repository
        .delete(user_id)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?;

    if !deleted {
        return Err(LibraryApplicationError::UserNotFound);
    }

    tracing::info!(user_id = %user_id, "User deleted");

    Ok(())
}

/// 初期管理者を用意する
///
/// 同じメールアドレスの利用者が既にいれば何もしない。
pub async fn ensure_admin(
    deps: &ServiceDependencies,
    email: &str,
    name: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<ApplicationUser> {
    if let Some(existing) = find_by_email(deps, &normalize_email(email)).await? {
        return Ok(existing);
    }

    create_user(
        deps,
        RegisterUser {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            registered_at: now,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("Secret123!").unwrap();

        assert_ne!(hash, "Secret123!");
        assert!(verify_password(&hash, "Secret123!").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
