use crate::domain::{ApplicationUser, Role, UserId};
use crate::ports::user_repository::{Result, UserRepository as UserRepositoryTrait};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

/// PostgreSQLの行データをApplicationUserに変換する
///
/// rolesはTEXT[]で保存し、Roleへの変換でエラーハンドリングを行う。
fn map_row_to_user(row: &PgRow) -> Result<ApplicationUser> {
    let role_names: Vec<String> = row.get("roles");
    let roles = role_names
        .iter()
        .map(|name| Role::from_str(name).map_err(invalid_data))
        .collect::<Result<Vec<_>>>()?;

    Ok(ApplicationUser {
        id: UserId::from_uuid(row.get("id")),
        user_name: row.get("user_name"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        roles,
        created_at: row.get("created_at"),
    })
}

fn role_names(user: &ApplicationUser) -> Vec<String> {
    user.roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// UserRepositoryのPostgreSQL実装
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn insert(&self, user: &ApplicationUser) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, user_name, email, name, password_hash, roles, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.value())
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(role_names(user))
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, user: &ApplicationUser) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                user_name = $2,
                email = $3,
                name = $4,
                password_hash = $5,
                roles = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.value())
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(role_names(user))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<ApplicationUser>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_name, email, name, password_hash, roles, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationUser>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_name, email, name, password_hash, roles, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_user).transpose()
    }

    async fn find_all(&self) -> Result<Vec<ApplicationUser>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_name, email, name, password_hash, roles, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_user).collect()
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
