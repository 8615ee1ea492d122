use chrono::{DateTime, Utc};

use crate::domain::{BorrowedBook, UserId, borrowing};

use crate::application::{LibraryApplicationError, Result, ServiceDependencies};

/// 貸出中の一覧（管理者向け）
pub async fn get_borrowed_books(deps: &ServiceDependencies) -> Result<Vec<BorrowedBook>> {
    deps.borrow_repository
        .find_open_all()
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)
}

/// 延滞中の一覧（返却期限が今日より前）
pub async fn get_overdue_books(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<Vec<BorrowedBook>> {
    deps.borrow_repository
        .find_open_due_before(borrowing::overdue_cutoff(now))
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)
}

/// 返却期限間近の一覧（今日から3日後まで）
pub async fn get_almost_due_books(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<Vec<BorrowedBook>> {
    let (from, to) = borrowing::almost_due_window(now);

    deps.borrow_repository
        .find_open_due_between(from, to)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)
}

pub async fn get_user_borrowed_books(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<BorrowedBook>> {
    deps.borrow_repository
        .find_open_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)
}
