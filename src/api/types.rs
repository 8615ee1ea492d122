use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::book::BookPage;
use crate::domain::{
    ApplicationUser, Book, BookDetails, BorrowedBook, Notification, Reservation, Role,
};

use super::error::ApiError;

/// 役割名をRoleに変換する
pub fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse::<Role>().map_err(ApiError::Validation)
}

// ============================================================================
// Books
// ============================================================================

/// 書籍検索のクエリパラメータ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search_query: Option<String>,
}

impl BooksQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE)
    }
}

/// 書籍の登録・更新リクエスト
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be 1-100 characters"))]
    pub author: String,
    #[validate(range(min = 0, max = 9999, message = "Invalid publication year"))]
    pub publication_year: i32,
    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    pub cover_image: Option<String>,
    /// 更新時のみ有効。省略時は現在の状態を維持する
    pub is_available: Option<bool>,
}

impl BookRequest {
    pub fn to_details(&self) -> BookDetails {
        BookDetails {
            title: self.title.clone(),
            author: self.author.clone(),
            publication_year: self.publication_year,
            category: self.category.clone(),
            isbn: self.isbn.clone(),
            description: self.description.clone(),
            cover_image: self.cover_image.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub is_available: bool,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            title: book.title,
            author: book.author,
            publication_year: book.publication_year,
            category: book.category,
            isbn: book.isbn,
            is_available: book.is_available,
            description: book.description,
            cover_image: book.cover_image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPageResponse {
    pub books: Vec<BookResponse>,
    pub total_books: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl From<BookPage> for BookPageResponse {
    fn from(page: BookPage) -> Self {
        Self {
            books: page.books.into_iter().map(BookResponse::from).collect(),
            total_books: page.total_books,
            current_page: page.current_page,
            page_size: page.page_size,
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// 管理者による利用者作成
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub role: String,
}

/// 利用者情報（パスワードハッシュは含めない）
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationUser> for UserResponse {
    fn from(user: ApplicationUser) -> Self {
        Self {
            id: user.id.value(),
            user_name: user.user_name,
            email: user.email,
            name: user.name,
            roles: user.roles.iter().map(|r| r.as_str().to_string()).collect(),
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Borrowing & reservations
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: Uuid,
    #[validate(range(min = 1, max = 365, message = "Days must be between 1 and 365"))]
    pub days: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub book_id: Uuid,
    #[serde(default)]
    pub notify_when_available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<BorrowedBook> for BorrowedBookResponse {
    fn from(borrowed: BorrowedBook) -> Self {
        Self {
            id: borrowed.id.value(),
            user_id: borrowed.user_id.value(),
            book_id: borrowed.book_id.value(),
            borrow_date: borrowed.borrow_date,
            due_date: borrowed.due_date,
            return_date: borrowed.return_date,
            status: borrowed.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub reservation_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub is_canceled: bool,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id.value(),
            user_id: reservation.user_id.value(),
            book_id: reservation.book_id.value(),
            reservation_date: reservation.reservation_date,
            expiry_date: reservation.expiry_date,
            is_canceled: reservation.is_canceled,
        }
    }
}

// ============================================================================
// Notifications & sweeps
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Option<Uuid>,
    pub message: String,
    pub is_sent: bool,
    pub sent_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.value(),
            user_id: notification.user_id.value(),
            book_id: notification.book_id.map(|id| id.value()),
            message: notification.message,
            is_sent: notification.is_sent,
            sent_date: notification.sent_date,
            created_date: notification.created_date,
        }
    }
}

/// バッチ処理の結果（処理件数）
#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    pub processed: usize,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
