//! PostgreSQLアダプターのテスト
//!
//! DATABASE_URLのデータベースが必要なため既定では実行しない。
//! `cargo test -- --ignored` で実行する。

mod common;

use chrono::{DateTime, Duration, Utc};
use library_management::adapters::postgres::{
    PostgresBookRepository, PostgresBorrowRepository, PostgresNotificationRepository,
    PostgresReservationRepository, PostgresUserRepository,
};
use library_management::domain::{
    ApplicationUser, Book, BorrowId, BorrowStatus, BorrowedBook, NotificationId, Reservation,
    ReservationId, Role, UserId,
    notification::new_notification,
};
use library_management::ports::{
    BookRepository, BorrowRepository, NotificationRepository, ReservationRepository,
    UserRepository,
};
use serial_test::serial;
use sqlx::PgPool;

/// PostgreSQLの時刻精度（マイクロ秒）に合わせて丸める
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(dt.timestamp_micros()).expect("Invalid timestamp")
}

async fn setup() -> PgPool {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    pool
}

async fn insert_user(pool: &PgPool, email: &str) -> ApplicationUser {
    let user = ApplicationUser::new(
        email.to_string(),
        "Reader".to_string(),
        "not-a-real-hash".to_string(),
        Role::User,
        truncate_to_micros(Utc::now()),
    );
    PostgresUserRepository::new(pool.clone())
        .insert(&user)
        .await
        .expect("Failed to insert user");
    user
}

async fn insert_book(pool: &PgPool, title: &str) -> Book {
    let book = Book::new(common::book_details(title));
    PostgresBookRepository::new(pool.clone())
        .insert(&book)
        .await
        .expect("Failed to insert book");
    book
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_book_search_and_count() {
    let pool = setup().await;
    let repository = PostgresBookRepository::new(pool.clone());

    for title in ["Emma", "Dune", "Carrie", "100% Pure"] {
        insert_book(&pool, title).await;
    }

    let first_page = repository.search(None, 1, 2).await.unwrap();
    assert_eq!(
        first_page.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
        vec!["100% Pure", "Carrie"]
    );
    assert_eq!(repository.count(None).await.unwrap(), 4);

    // ワイルドカード文字はそのまま検索される
    let percent = repository.search(Some("%"), 1, 10).await.unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(repository.count(Some("DUNE")).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_book_save_and_delete() {
    let pool = setup().await;
    let repository = PostgresBookRepository::new(pool.clone());
    let book = insert_book(&pool, "Dune").await;

    let updated = Book {
        is_available: false,
        ..book.clone()
    };
    repository.save(&updated).await.unwrap();

    let loaded = repository.get_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(loaded, updated);

    assert!(repository.delete(book.id).await.unwrap());
    assert!(!repository.delete(book.id).await.unwrap());
    assert!(repository.get_by_id(book.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_user_lookup_by_email() {
    let pool = setup().await;
    let repository = PostgresUserRepository::new(pool.clone());
    let user = insert_user(&pool, "reader@example.com").await;

    let found = repository
        .find_by_email("reader@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, user);
    assert!(found.has_role(Role::User));

    let duplicate = ApplicationUser::new(
        "reader@example.com".to_string(),
        "Someone".to_string(),
        "hash".to_string(),
        Role::User,
        Utc::now(),
    );
    assert!(repository.insert(&duplicate).await.is_err());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_borrow_open_queries() {
    let pool = setup().await;
    let repository = PostgresBorrowRepository::new(pool.clone());
    let user = insert_user(&pool, "reader@example.com").await;
    let book = insert_book(&pool, "Dune").await;
    let now = truncate_to_micros(Utc::now());

    let borrowed = BorrowedBook {
        id: BorrowId::new(),
        user_id: user.id,
        book_id: book.id,
        borrow_date: now - Duration::days(10),
        due_date: now - Duration::days(3),
        return_date: None,
        status: BorrowStatus::Borrowed,
    };
    repository.insert(&borrowed).await.unwrap();

    assert_eq!(
        repository.find_open(user.id, book.id).await.unwrap(),
        Some(borrowed.clone())
    );
    assert_eq!(repository.find_open_due_before(now).await.unwrap().len(), 1);
    assert!(
        repository
            .find_open_due_between(now, now + Duration::days(4))
            .await
            .unwrap()
            .is_empty()
    );

    let returned = BorrowedBook {
        return_date: Some(now),
        status: BorrowStatus::Returned,
        ..borrowed
    };
    repository.save(&returned).await.unwrap();

    assert!(repository.find_open_for_book(book.id).await.unwrap().is_none());
    assert!(repository.find_open_for_user(user.id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_reservation_queue_order() {
    let pool = setup().await;
    let repository = PostgresReservationRepository::new(pool.clone());
    let first_user = insert_user(&pool, "first@example.com").await;
    let second_user = insert_user(&pool, "second@example.com").await;
    let book = insert_book(&pool, "Dune").await;
    let now = truncate_to_micros(Utc::now());

    let reservation = |user_id: UserId, reserved_at: DateTime<Utc>| Reservation {
        id: ReservationId::new(),
        user_id,
        book_id: book.id,
        reservation_date: reserved_at,
        expiry_date: reserved_at + Duration::days(1),
        is_canceled: false,
    };

    let first = reservation(first_user.id, now - Duration::hours(2));
    let second = reservation(second_user.id, now - Duration::hours(1));
    repository.insert(&second).await.unwrap();
    repository.insert(&first).await.unwrap();

    assert_eq!(
        repository.find_next_active(book.id, now, None).await.unwrap(),
        Some(first.clone())
    );
    assert_eq!(
        repository
            .find_next_active(book.id, now, Some(first.id))
            .await
            .unwrap(),
        Some(second.clone())
    );
    assert_eq!(
        repository
            .find_by_user_and_book(second_user.id, book.id)
            .await
            .unwrap(),
        Some(second.clone())
    );

    repository
        .save(&Reservation {
            is_canceled: true,
            ..first.clone()
        })
        .await
        .unwrap();

    assert_eq!(repository.find_not_canceled().await.unwrap(), vec![second.clone()]);
    assert!(repository.delete(second.id).await.unwrap());
    assert!(repository.get_by_id(second.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL"]
async fn test_notification_unsent_queries() {
    let pool = setup().await;
    let repository = PostgresNotificationRepository::new(pool.clone());
    let user = insert_user(&pool, "reader@example.com").await;
    let book = insert_book(&pool, "Dune").await;
    let now = truncate_to_micros(Utc::now());

    let interest = new_notification(user.id, "interest".to_string(), Some(book.id), now);
    let reminder = new_notification(user.id, "reminder".to_string(), None, now);
    repository.insert(&interest).await.unwrap();
    repository.insert(&reminder).await.unwrap();

    assert_eq!(repository.find_unsent().await.unwrap().len(), 2);
    assert_eq!(
        repository.find_unsent_for_book(book.id).await.unwrap(),
        vec![interest.clone()]
    );

    let sent = library_management::domain::notification::mark_sent(&interest, now).unwrap();
    repository.save(&sent).await.unwrap();

    assert_eq!(
        repository.find_unsent_for_user(user.id).await.unwrap(),
        vec![reminder.clone()]
    );
    assert_eq!(repository.get_by_id(interest.id).await.unwrap(), Some(sent));
    assert!(!repository.delete(NotificationId::new()).await.unwrap());
}
