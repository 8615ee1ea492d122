use crate::domain::{Book, BookId};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_book(row: &PgRow) -> Book {
    Book {
        id: BookId::from_uuid(row.get("id")),
        title: row.get("title"),
        author: row.get("author"),
        publication_year: row.get("publication_year"),
        category: row.get("category"),
        isbn: row.get("isbn"),
        is_available: row.get("is_available"),
        description: row.get("description"),
        cover_image: row.get("cover_image"),
    }
}

/// 検索語をILIKEのパターンに変換する（`%`と`_`はエスケープ）
fn like_pattern(query: Option<&str>) -> Option<String> {
    query.map(|q| {
        let escaped = q
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

/// BookRepositoryのPostgreSQL実装
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, publication_year, category, isbn,
                   is_available, description, cover_image
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_book))
    }

    /// タイトル昇順（同名はID順）でページング
    async fn search(&self, query: Option<&str>, page: u32, page_size: u32) -> Result<Vec<Book>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let rows = sqlx::query(
            r#"
            SELECT id, title, author, publication_year, category, isbn,
                   is_available, description, cover_image
            FROM books
            WHERE $1::TEXT IS NULL
               OR title ILIKE $1 ESCAPE '\'
               OR author ILIKE $1 ESCAPE '\'
               OR category ILIKE $1 ESCAPE '\'
               OR isbn ILIKE $1 ESCAPE '\'
            ORDER BY title ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like_pattern(query))
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_book).collect())
    }

    async fn count(&self, query: Option<&str>) -> Result<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM books
            WHERE $1::TEXT IS NULL
               OR title ILIKE $1 ESCAPE '\'
               OR author ILIKE $1 ESCAPE '\'
               OR category ILIKE $1 ESCAPE '\'
               OR isbn ILIKE $1 ESCAPE '\'
            "#,
        )
        .bind(like_pattern(query))
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }

    async fn insert(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, publication_year, category, isbn,
                is_available, description, cover_image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(book.id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publication_year)
        .bind(&book.category)
        .bind(&book.isbn)
        .bind(book.is_available)
        .bind(&book.description)
        .bind(&book.cover_image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE books SET
                title = $2,
                author = $3,
                publication_year = $4,
                category = $5,
                isbn = $6,
                is_available = $7,
                description = $8,
                cover_image = $9
            WHERE id = $1
            "#,
        )
        .bind(book.id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.publication_year)
        .bind(&book.category)
        .bind(&book.isbn)
        .bind(book.is_available)
        .bind(&book.description)
        .bind(&book.cover_image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some("50%_off")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern(None), None);
    }
}
