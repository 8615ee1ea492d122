use crate::domain::{Book, BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍リポジトリポート
///
/// カタログの永続化を抽象化する。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// IDで書籍を取得する
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書籍を検索する
    ///
    /// タイトル・著者・分類・ISBNの部分一致（大文字小文字を区別しない）。
    /// タイトル昇順に並べ、`(page - 1) * page_size`件読み飛ばして`page_size`件返す。
    /// `page`は1始まり。
    async fn search(&self, query: Option<&str>, page: u32, page_size: u32) -> Result<Vec<Book>>;

    /// 検索条件に一致する件数
    async fn count(&self, query: Option<&str>) -> Result<u64>;

    /// 新しい書籍を登録する
    async fn insert(&self, book: &Book) -> Result<()>;

    /// 書籍の状態を保存する（全項目の上書き）
    async fn save(&self, book: &Book) -> Result<()>;

    /// 書籍を削除する
    ///
    /// 削除した場合は`true`、存在しなかった場合は`false`。
    async fn delete(&self, book_id: BookId) -> Result<bool>;
}
