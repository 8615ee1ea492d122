use crate::domain::{BookId, Reservation, ReservationId, UserId, reservation::next_in_queue};
use crate::ports::reservation_repository::{
    ReservationRepository as ReservationRepositoryTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;

/// In-memory implementation of ReservationRepository
///
/// Rejects a second non-canceled reservation for the same (user, book).
#[derive(Default)]
pub struct ReservationRepository {
    reservations: Mutex<HashMap<ReservationId, Reservation>>,
}

impl ReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_where(
        &self,
        predicate: impl Fn(&Reservation) -> bool,
        newest_first: bool,
    ) -> Result<Vec<Reservation>> {
        let mut found: Vec<Reservation> = lock(&self.reservations)?
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.reservation_date, r.id));
        if newest_first {
            found.reverse();
        }
        Ok(found)
    }
}

#[async_trait]
impl ReservationRepositoryTrait for ReservationRepository {
    async fn insert(&self, reservation: &Reservation) -> Result<()> {
        let mut reservations = lock(&self.reservations)?;
        let duplicate = !reservation.is_canceled
            && reservations.values().any(|r| {
                !r.is_canceled
                    && r.user_id == reservation.user_id
                    && r.book_id == reservation.book_id
            });
        if duplicate {
            return Err("reservation already exists for this user and book".into());
        }
        reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn save(&self, reservation: &Reservation) -> Result<()> {
        lock(&self.reservations)?.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        Ok(lock(&self.reservations)?.get(&reservation_id).cloned())
    }

    async fn delete(&self, reservation_id: ReservationId) -> Result<bool> {
        Ok(lock(&self.reservations)?.remove(&reservation_id).is_some())
    }

    async fn find_all(&self) -> Result<Vec<Reservation>> {
        self.sorted_where(|_| true, true)
    }

    async fn find_not_canceled(&self) -> Result<Vec<Reservation>> {
        self.sorted_where(|r| !r.is_canceled, false)
    }

    async fn find_for_user(&self, user_id: UserId) -> Result<Vec<Reservation>> {
        self.sorted_where(|r| r.user_id == user_id, true)
    }

    async fn find_by_user_and_book(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Reservation>> {
        Ok(self
            .sorted_where(
                |r| !r.is_canceled && r.user_id == user_id && r.book_id == book_id,
                false,
            )?
            .into_iter()
            .next())
    }

    async fn find_next_active(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
        excluding: Option<ReservationId>,
    ) -> Result<Option<Reservation>> {
        let reservations = lock(&self.reservations)?;
        Ok(next_in_queue(reservations.values(), book_id, now, excluding).cloned())
    }
}
