use crate::domain::{BookId, Reservation, ReservationId, UserId};
use crate::ports::reservation_repository::{
    ReservationRepository as ReservationRepositoryTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_reservation(row: &PgRow) -> Reservation {
    Reservation {
        id: ReservationId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        reservation_date: row.get("reservation_date"),
        expiry_date: row.get("expiry_date"),
        is_canceled: row.get("is_canceled"),
    }
}

/// ReservationRepositoryのPostgreSQL実装
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepositoryTrait for ReservationRepository {
    async fn insert(&self, reservation: &Reservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, user_id, book_id, reservation_date, expiry_date, is_canceled
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reservation.id.value())
        .bind(reservation.user_id.value())
        .bind(reservation.book_id.value())
        .bind(reservation.reservation_date)
        .bind(reservation.expiry_date)
        .bind(reservation.is_canceled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, reservation: &Reservation) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE reservations SET
                user_id = $2,
                book_id = $3,
                reservation_date = $4,
                expiry_date = $5,
                is_canceled = $6
            WHERE id = $1
            "#,
        )
        .bind(reservation.id.value())
        .bind(reservation.user_id.value())
        .bind(reservation.book_id.value())
        .bind(reservation.reservation_date)
        .bind(reservation.expiry_date)
        .bind(reservation.is_canceled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, reservation_date, expiry_date, is_canceled
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(reservation_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_reservation))
    }

    async fn delete(&self, reservation_id: ReservationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(reservation_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_all(&self) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, reservation_date, expiry_date, is_canceled
            FROM reservations
            ORDER BY reservation_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_reservation).collect())
    }

    async fn find_not_canceled(&self) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, reservation_date, expiry_date, is_canceled
            FROM reservations
            WHERE NOT is_canceled
            ORDER BY reservation_date ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_reservation).collect())
    }

    async fn find_for_user(&self, user_id: UserId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, reservation_date, expiry_date, is_canceled
            FROM reservations
            WHERE user_id = $1
            ORDER BY reservation_date DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_reservation).collect())
    }

    async fn find_by_user_and_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Reservation>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, reservation_date, expiry_date, is_canceled
            FROM reservations
            WHERE user_id = $1 AND book_id = $2 AND NOT is_canceled
            "#,
        )
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_reservation))
    }

    /// 待ち行列の先頭（部分インデックス`idx_reservations_queue`を使用）
    async fn find_next_active(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
        excluding: Option<ReservationId>,
    ) -> Result<Option<Reservation>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, reservation_date, expiry_date, is_canceled
            FROM reservations
            WHERE book_id = $1
              AND NOT is_canceled
              AND expiry_date >= $2
              AND ($3::UUID IS NULL OR id <> $3)
            ORDER BY reservation_date ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(book_id.value())
        .bind(now)
        .bind(excluding.map(|id| id.value()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_reservation))
    }
}
