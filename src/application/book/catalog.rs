use crate::domain::{Book, BookDetails, BookId};

use crate::application::{LibraryApplicationError, Result, ServiceDependencies};

/// 1ページあたりの最大件数
pub const MAX_PAGE_SIZE: u32 = 100;

/// 検索結果の1ページ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total_books: u64,
    pub current_page: u32,
    pub page_size: u32,
}

/// 書籍を検索する
///
/// タイトル・著者・分類・ISBNの部分一致（大文字小文字を区別しない）。
/// タイトル昇順で`page`ページ目（1始まり）を返す。
/// 空白のみの検索語は指定なしとして扱う。
pub async fn get_books(
    deps: &ServiceDependencies,
    page: u32,
    page_size: u32,
    query: Option<&str>,
) -> Result<BookPage> {
    if page < 1 {
        return Err(LibraryApplicationError::InvalidPage(
            "page must be at least 1".to_string(),
        ));
    }

    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(LibraryApplicationError::InvalidPage(format!(
            "pageSize must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let query = query.map(str::trim).filter(|q| !q.is_empty());

    let (books, total_books) = futures::try_join!(
        deps.book_repository.search(query, page, page_size),
        deps.book_repository.count(query),
    )
    .map_err(LibraryApplicationError::BookRepositoryError)?;

    Ok(BookPage {
        books,
        total_books,
        current_page: page,
        page_size,
    })
}

pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.book_repository
        .get_by_id(book_id)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?
        .ok_or(LibraryApplicationError::BookNotFound)
}

/// 書籍を登録する（初期状態は貸出可能）
pub async fn add_book(deps: &ServiceDependencies, details: BookDetails) -> Result<Book> {
    let book = Book::new(details);

    deps.book_repository
        .insert(&book)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    tracing::info!(book_id = %book.id, title = %book.title, "Book added");

    Ok(book)
}

/// 書誌情報を更新する
///
/// `is_available`は管理者が明示した場合のみ変更する。
pub async fn update_book(
    deps: &ServiceDependencies,
    book_id: BookId,
    details: BookDetails,
    is_available: Option<bool>,
) -> Result<Book> {
    let book = get_book(deps, book_id).await?.with_details(details, is_available);

    deps.book_repository
        .save(&book)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    tracing::info!(book_id = %book.id, "Book updated");

    Ok(book)
}

/// 書籍を削除する
///
/// ビジネスルール：
/// - 貸出中の書籍は削除できない
/// - 未取消の予約がある書籍は削除できない
pub async fn delete_book(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    get_book(deps, book_id).await?;

    let on_loan = deps
        .borrow_repository
        .find_open_for_book(book_id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?
        .is_some();

    let reserved = deps
        .reservation_repository
        .find_not_canceled()
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?
        .iter()
        .any(|r| r.book_id == book_id);

    if on_loan || reserved {
        return Err(LibraryApplicationError::BookInUse);
    }

    let deleted = deps
        .book_repository
        .delete(book_id)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    if !deleted {
        return Err(LibraryApplicationError::BookNotFound);
    }

    tracing::info!(book_id = %book_id, "Book deleted");

    Ok(())
}
