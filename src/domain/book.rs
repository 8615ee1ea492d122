use serde::{Deserialize, Serialize};

use super::BookId;

/// 書籍 - カタログの1タイトル
///
/// 在庫冊数はモデル化しない（1タイトル1冊）。
/// `is_available`は貸出中、または予約で確保されている間は`false`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub is_available: bool,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

/// 書籍の書誌情報（登録・更新の入力）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl Book {
    /// 新しい書籍を登録する（初期状態は貸出可能）
    pub fn new(details: BookDetails) -> Self {
        Self {
            id: BookId::new(),
            title: details.title,
            author: details.author,
            publication_year: details.publication_year,
            category: details.category,
            isbn: details.isbn,
            is_available: true,
            description: details.description,
            cover_image: details.cover_image,
        }
    }

    /// 書誌情報を差し替えた新しいBookを返す
    ///
    /// `is_available`は管理者が明示した場合のみ変更する。
    pub fn with_details(&self, details: BookDetails, is_available: Option<bool>) -> Self {
        Self {
            id: self.id,
            title: details.title,
            author: details.author,
            publication_year: details.publication_year,
            category: details.category,
            isbn: details.isbn,
            is_available: is_available.unwrap_or(self.is_available),
            description: details.description,
            cover_image: details.cover_image,
        }
    }

    /// タイトル・著者・分類・ISBNの部分一致検索（大文字小文字を区別しない）
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&needle);

        contains(&self.title)
            || contains(&self.author)
            || self.category.as_deref().is_some_and(contains)
            || self.isbn.as_deref().is_some_and(contains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(title: &str) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "George Orwell".to_string(),
            publication_year: 1949,
            category: Some("Dystopia".to_string()),
            isbn: Some("9780451524935".to_string()),
            description: None,
            cover_image: None,
        }
    }

    #[test]
    fn test_new_book_is_available() {
        let book = Book::new(details("1984"));
        assert!(book.is_available);
        assert_eq!(book.title, "1984");
    }

    #[test]
    fn test_with_details_keeps_id_and_availability() {
        let mut book = Book::new(details("1984"));
        book.is_available = false;

        let updated = book.with_details(details("Animal Farm"), None);
        assert_eq!(updated.id, book.id);
        assert_eq!(updated.title, "Animal Farm");
        assert!(!updated.is_available);

        let released = book.with_details(details("1984"), Some(true));
        assert!(released.is_available);
    }

    #[test]
    fn test_matches_any_searchable_field_case_insensitive() {
        let book = Book::new(details("1984"));
        assert!(book.matches("orwell"));
        assert!(book.matches("DYSTOP"));
        assert!(book.matches("52493"));
        assert!(book.matches("198"));
        assert!(!book.matches("huxley"));
    }

    #[test]
    fn test_matches_ignores_missing_optional_fields() {
        let mut d = details("Brave New World");
        d.category = None;
        d.isbn = None;
        let book = Book::new(d);
        assert!(!book.matches("dystopia"));
    }
}
