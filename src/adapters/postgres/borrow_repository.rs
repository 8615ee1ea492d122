use crate::domain::{BookId, BorrowId, BorrowStatus, BorrowedBook, UserId};
use crate::ports::borrow_repository::{BorrowRepository as BorrowRepositoryTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

/// PostgreSQLの行データをBorrowedBookに変換する
///
/// statusの文字列からの変換でエラーハンドリングを行う。
fn map_row_to_borrowed_book(row: &PgRow) -> Result<BorrowedBook> {
    let status_str: &str = row.get("status");
    let status = BorrowStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(BorrowedBook {
        id: BorrowId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        borrow_date: row.get("borrow_date"),
        due_date: row.get("due_date"),
        return_date: row.get("return_date"),
        status,
    })
}

/// BorrowRepositoryのPostgreSQL実装
///
/// 未返却レコードは`return_date IS NULL`で表す。
/// (user_id, book_id)の部分ユニークインデックスが同時貸出を防ぐ。
pub struct BorrowRepository {
    pool: PgPool,
}

impl BorrowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowRepositoryTrait for BorrowRepository {
    async fn insert(&self, borrowed: &BorrowedBook) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO borrowed_books (
                id, user_id, book_id, borrow_date, due_date, return_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(borrowed.id.value())
        .bind(borrowed.user_id.value())
        .bind(borrowed.book_id.value())
        .bind(borrowed.borrow_date)
        .bind(borrowed.due_date)
        .bind(borrowed.return_date)
        .bind(borrowed.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, borrowed: &BorrowedBook) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE borrowed_books SET
                due_date = $2,
                return_date = $3,
                status = $4
            WHERE id = $1
            "#,
        )
        .bind(borrowed.id.value())
        .bind(borrowed.due_date)
        .bind(borrowed.return_date)
        .bind(borrowed.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_open(&self, user_id: UserId, book_id: BookId) -> Result<Option<BorrowedBook>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, due_date, return_date, status
            FROM borrowed_books
            WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrowed_book).transpose()
    }

    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<BorrowedBook>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, due_date, return_date, status
            FROM borrowed_books
            WHERE book_id = $1 AND return_date IS NULL
            ORDER BY borrow_date ASC
            LIMIT 1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrowed_book).transpose()
    }

    async fn find_open_all(&self) -> Result<Vec<BorrowedBook>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, due_date, return_date, status
            FROM borrowed_books
            WHERE return_date IS NULL
            ORDER BY borrow_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_borrowed_book).collect()
    }

    async fn find_open_for_user(&self, user_id: UserId) -> Result<Vec<BorrowedBook>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, due_date, return_date, status
            FROM borrowed_books
            WHERE user_id = $1 AND return_date IS NULL
            ORDER BY borrow_date DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_borrowed_book).collect()
    }

    /// 延滞候補（部分インデックス`idx_borrowed_books_open_due`を使用）
    async fn find_open_due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<BorrowedBook>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, due_date, return_date, status
            FROM borrowed_books
            WHERE return_date IS NULL AND due_date < $1
            ORDER BY due_date ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_borrowed_book).collect()
    }

    async fn find_open_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BorrowedBook>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, due_date, return_date, status
            FROM borrowed_books
            WHERE return_date IS NULL AND due_date >= $1 AND due_date < $2
            ORDER BY due_date ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_borrowed_book).collect()
    }
}
