use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::book;
use crate::domain::BookId;

use super::super::{
    auth::AdminUser,
    error::ApiError,
    extract::{JsonBody, PathParam, QueryParams},
    types::{BookPageResponse, BookRequest, BookResponse, BooksQuery},
};
use super::{AppState, validated};

/// GET /books - 書籍検索（匿名アクセス可）
///
/// クエリパラメータ:
/// - page: ページ番号（1始まり、省略時1）
/// - pageSize: 1ページの件数（省略時10）
/// - searchQuery: タイトル・著者・分類・ISBNの部分一致
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<BooksQuery>,
) -> Result<Json<BookPageResponse>, ApiError> {
    let page = book::get_books(
        &state.service_deps,
        query.page(),
        query.page_size(),
        query.search_query.as_deref(),
    )
    .await?;

    Ok(Json(page.into()))
}

/// GET /books/:id - 書籍詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    PathParam(book_id): PathParam<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = book::get_book(&state.service_deps, BookId::from_uuid(book_id)).await?;
    Ok(Json(book.into()))
}

/// POST /books - 書籍登録（管理者）
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    JsonBody(req): JsonBody<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let req = validated(req)?;
    let book = book::add_book(&state.service_deps, req.to_details()).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// PUT /books/:id - 書籍更新（管理者）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    PathParam(book_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let req = validated(req)?;
    let book = book::update_book(
        &state.service_deps,
        BookId::from_uuid(book_id),
        req.to_details(),
        req.is_available,
    )
    .await?;
    Ok(Json(book.into()))
}

/// DELETE /books/:id - 書籍削除（管理者）
///
/// 貸出中・予約中の書籍は削除できない。
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    PathParam(book_id): PathParam<Uuid>,
) -> Result<StatusCode, ApiError> {
    book::delete_book(&state.service_deps, BookId::from_uuid(book_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
