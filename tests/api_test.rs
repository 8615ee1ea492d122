use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use library_management::api::types::*;
use library_management::api::{AppState, create_router};
use library_management::config::AuthConfig;
use library_management::domain::Role;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::{TestContext, in_memory_context, seed_book, seed_user_with_role};

// ============================================================================
// ヘルパー
// ============================================================================

async fn setup_app() -> (Router, TestContext) {
    let ctx = in_memory_context();

    let app_state = Arc::new(AppState {
        service_deps: ctx.deps.clone(),
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        },
    });

    (create_router(app_state), ctx)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// 利用者を登録してトークンを取得する
async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/users/register",
        None,
        Some(json!({ "email": email, "name": "Reader", "password": "Password123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    login(app, email, "Password123!").await
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response: LoginResponse = serde_json::from_value(body).unwrap();
    response.token
}

async fn admin_token(app: &Router, ctx: &TestContext) -> String {
    seed_user_with_role(&ctx.deps, "admin@example.com", Role::Admin, Utc::now()).await;
    login(app, "admin@example.com", "Password123!").await
}

// ============================================================================
// テスト
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_books_is_anonymous_and_paginated() {
    let (app, ctx) = setup_app().await;
    for title in ["Emma", "Dune", "Carrie"] {
        seed_book(&ctx.deps, title).await;
    }

    let (status, body) = send(&app, "GET", "/books?page=1&pageSize=2", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let page: BookPageResponse = serde_json::from_value(body).unwrap();
    assert_eq!(page.total_books, 3);
    assert_eq!(
        page.books.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
        vec!["Carrie", "Dune"]
    );
}

#[tokio::test]
async fn test_invalid_page_size_returns_error_body() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, "GET", "/books?pageSize=500", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pageSize"));
}

#[tokio::test]
async fn test_malformed_requests_return_error_body() {
    let (app, ctx) = setup_app().await;
    seed_book(&ctx.deps, "Dune").await;
    let token = register_and_login(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/borrow",
        Some(&token),
        Some(json!({ "bookId": "nope", "days": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    for uri in ["/books/not-a-uuid", "/books?page=abc"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }

    let (status, body) = send(
        &app,
        "DELETE",
        "/users/reservations/123",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_book_returns_404() {
    let (app, _) = setup_app().await;

    let uri = format!("/books/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, "GET", &uri, None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Book not found" }));
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, "GET", "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/users/me", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let (app, _) = setup_app().await;
    let token = register_and_login(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "title": "Dune", "author": "Frank Herbert", "publicationYear": 1965 })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Admin role required" }));
}

#[tokio::test]
async fn test_register_validates_and_rejects_duplicates() {
    let (app, _) = setup_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({ "email": "not-an-email", "name": "Reader", "password": "Password123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    register_and_login(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({ "email": "Reader@Example.com", "name": "Again", "password": "Password123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email is already taken" }));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let (app, _) = setup_app().await;
    register_and_login(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "reader@example.com", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid email or password" }));
}

#[tokio::test]
async fn test_borrow_and_return_through_api() {
    let (app, ctx) = setup_app().await;
    let book = seed_book(&ctx.deps, "Dune").await;
    let token = register_and_login(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/borrow",
        Some(&token),
        Some(json!({ "bookId": book.id.value(), "days": 14 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let borrowed: BorrowedBookResponse = serde_json::from_value(body).unwrap();
    assert_eq!(borrowed.due_date - borrowed.borrow_date, chrono::Duration::days(14));

    let (status, body) = send(&app, "GET", "/users/borrowed-books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", &format!("/books/{}", book.id), None, None).await;
    assert_eq!(body["isAvailable"], json!(false));

    let (status, body) = send(
        &app,
        "POST",
        "/users/return",
        Some(&token),
        Some(json!({ "bookId": book.id.value() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("returned"));

    let (status, body) = send(
        &app,
        "POST",
        "/users/return",
        Some(&token),
        Some(json!({ "bookId": book.id.value() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Book not found or already returned" }));
}

#[tokio::test]
async fn test_reserve_and_cancel_through_api() {
    let (app, ctx) = setup_app().await;
    let book = seed_book(&ctx.deps, "1984").await;
    let holder = register_and_login(&app, "holder@example.com").await;
    let reader = register_and_login(&app, "reader@example.com").await;

    // 貸出可能な書籍は予約できない
    let (status, _) = send(
        &app,
        "POST",
        "/users/reserve",
        Some(&reader),
        Some(json!({ "bookId": book.id.value() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        "POST",
        "/users/borrow",
        Some(&holder),
        Some(json!({ "bookId": book.id.value(), "days": 7 })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/reserve",
        Some(&reader),
        Some(json!({ "bookId": book.id.value() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reservation: ReservationResponse = serde_json::from_value(body).unwrap();

    // 他人の予約は取り消せない
    let uri = format!("/users/reservations/{}", reservation.id);
    let (status, _) = send(&app, "DELETE", &uri, Some(&holder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isCanceled"], json!(true));

    let (_, body) = send(&app, "GET", "/notifications", Some(&reader), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_manages_catalog_and_runs_sweeps() {
    let (app, ctx) = setup_app().await;
    let token = admin_token(&app, &ctx).await;

    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "title": "Dune", "author": "Frank Herbert", "publicationYear": 1965 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: BookResponse = serde_json::from_value(body).unwrap();
    assert!(created.is_available);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{}", created.id),
        Some(&token),
        Some(json!({
            "title": "Dune Messiah",
            "author": "Frank Herbert",
            "publicationYear": 1969,
            "isAvailable": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], json!("Dune Messiah"));
    assert_eq!(body["isAvailable"], json!(false));

    for path in [
        "/admin/send-notifications",
        "/admin/detect-overdue",
        "/admin/release-expired-reservations",
    ] {
        let (status, body) = send(&app, "POST", path, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(body, json!({ "processed": 0 }), "{}", path);
    }

    let (status, _) = send(&app, "DELETE", &format!("/books/{}", created.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let (app, ctx) = setup_app().await;
    let token = admin_token(&app, &ctx).await;

    let (_, me) = send(&app, "GET", "/users/me", Some(&token), None).await;
    let uri = format!("/users/{}", me["id"].as_str().unwrap());

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
