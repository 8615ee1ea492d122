use crate::domain::{Book, BookId};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;

/// In-memory implementation of BookRepository
#[derive(Default)]
pub struct BookRepository {
    books: Mutex<HashMap<BookId, Book>>,
}

impl BookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&self, query: Option<&str>) -> Result<Vec<Book>> {
        let books = lock(&self.books)?;
        let mut matches: Vec<Book> = books
            .values()
            .filter(|book| query.is_none_or(|q| book.matches(q)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(matches)
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(lock(&self.books)?.get(&book_id).cloned())
    }

    async fn search(&self, query: Option<&str>, page: u32, page_size: u32) -> Result<Vec<Book>> {
        let skip = page.saturating_sub(1) as usize * page_size as usize;
        Ok(self
            .matching(query)?
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect())
    }

    async fn count(&self, query: Option<&str>) -> Result<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn insert(&self, book: &Book) -> Result<()> {
        let mut books = lock(&self.books)?;
        if books.contains_key(&book.id) {
            return Err(format!("duplicate book id {}", book.id).into());
        }
        books.insert(book.id, book.clone());
        Ok(())
    }

    async fn save(&self, book: &Book) -> Result<()> {
        lock(&self.books)?.insert(book.id, book.clone());
        Ok(())
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        Ok(lock(&self.books)?.remove(&book_id).is_some())
    }
}
