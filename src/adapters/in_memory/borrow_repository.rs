use crate::domain::{BookId, BorrowId, BorrowedBook, UserId};
use crate::ports::borrow_repository::{BorrowRepository as BorrowRepositoryTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;

/// In-memory implementation of BorrowRepository
///
/// Rejects a second open record for the same (user, book),
/// mirroring the partial unique index of the database schema.
#[derive(Default)]
pub struct BorrowRepository {
    records: Mutex<HashMap<BorrowId, BorrowedBook>>,
}

impl BorrowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn open_where(&self, predicate: impl Fn(&BorrowedBook) -> bool) -> Result<Vec<BorrowedBook>> {
        Ok(lock(&self.records)?
            .values()
            .filter(|b| b.is_open() && predicate(b))
            .cloned()
            .collect())
    }

    fn newest_first(mut records: Vec<BorrowedBook>) -> Vec<BorrowedBook> {
        records.sort_by(|a, b| b.borrow_date.cmp(&a.borrow_date));
        records
    }

    fn earliest_due_first(mut records: Vec<BorrowedBook>) -> Vec<BorrowedBook> {
        records.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        records
    }
}

#[async_trait]
impl BorrowRepositoryTrait for BorrowRepository {
    async fn insert(&self, borrowed: &BorrowedBook) -> Result<()> {
        let mut records = lock(&self.records)?;
        let duplicate = records.values().any(|b| {
            b.is_open() && b.user_id == borrowed.user_id && b.book_id == borrowed.book_id
        });
        if duplicate {
            return Err("open borrow already exists for this user and book".into());
        }
        records.insert(borrowed.id, borrowed.clone());
        Ok(())
    }

    async fn save(&self, borrowed: &BorrowedBook) -> Result<()> {
        lock(&self.records)?.insert(borrowed.id, borrowed.clone());
        Ok(())
    }

    async fn find_open(&self, user_id: UserId, book_id: BookId) -> Result<Option<BorrowedBook>> {
        Ok(self
            .open_where(|b| b.user_id == user_id && b.book_id == book_id)?
            .into_iter()
            .next())
    }

    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<BorrowedBook>> {
        Ok(self
            .open_where(|b| b.book_id == book_id)?
            .into_iter()
            .min_by_key(|b| b.borrow_date))
    }

    async fn find_open_all(&self) -> Result<Vec<BorrowedBook>> {
        Ok(Self::newest_first(self.open_where(|_| true)?))
    }

    async fn find_open_for_user(&self, user_id: UserId) -> Result<Vec<BorrowedBook>> {
        Ok(Self::newest_first(self.open_where(|b| b.user_id == user_id)?))
    }

    async fn find_open_due_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<BorrowedBook>> {
        Ok(Self::earliest_due_first(
            self.open_where(|b| b.due_date < cutoff)?,
        ))
    }

    async fn find_open_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BorrowedBook>> {
        Ok(Self::earliest_due_first(
            self.open_where(|b| b.due_date >= from && b.due_date < to)?,
        ))
    }
}
