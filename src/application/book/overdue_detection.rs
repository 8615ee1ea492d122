use chrono::{DateTime, Utc};

use crate::domain::{self, commands::CreateNotification, notification::messages};

use crate::application::{
    LibraryApplicationError, Result, ServiceDependencies, notification::create_notification,
};

/// 延滞検出バッチ
///
/// 外部から定期的に実行され、返却期限を過ぎた貸出をOverdueに遷移させる。
///
/// ビジネスルール：
/// - 返却期限が今日より前の未返却の貸出を延滞とする
/// - 既にOverdue状態の貸出は処理しない（重複通知防止）
///
/// 延滞を検出した利用者には未送信の督促通知を残す。
/// 督促は書籍に紐づけない（返却時の入荷通知の対象にしないため）。
///
/// # 戻り値
/// 延滞として検出した貸出の件数
pub async fn detect_overdue_borrows(deps: &ServiceDependencies, now: DateTime<Utc>) -> Result<usize> {
    let mut detected_count = 0;

    // 1. 延滞候補を取得
    let candidates = deps
        .borrow_repository
        .find_open_due_before(domain::borrowing::overdue_cutoff(now))
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?;

    // 2. Borrowed状態のものだけ遷移
    for borrowed in candidates {
        let Some(overdue) = domain::borrowing::mark_overdue(&borrowed, now) else {
            continue;
        };

        deps.borrow_repository
            .save(&overdue)
            .await
            .map_err(LibraryApplicationError::BorrowRepositoryError)?;

        let title = deps
            .book_repository
            .get_by_id(overdue.book_id)
            .await
            .map_err(LibraryApplicationError::BookRepositoryError)?
            .map(|book| book.title)
            .unwrap_or_default();

        // 3. 督促通知（未送信のまま残す）
        create_notification(
            deps,
            CreateNotification {
                user_id: overdue.user_id,
                message: messages::overdue_reminder(&title, overdue.due_date),
                book_id: None,
                send_immediately: false,
                created_at: now,
            },
        )
        .await?;

        tracing::info!(
            borrow_id = %overdue.id,
            user_id = %overdue.user_id,
            due_date = %overdue.due_date,
            "Borrow marked overdue"
        );

        detected_count += 1;
    }

    Ok(detected_count)
}
