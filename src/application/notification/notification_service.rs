use chrono::{DateTime, Utc};

use crate::domain::{self, BookId, Notification, NotificationId, UserId, commands::CreateNotification};

use crate::application::{LibraryApplicationError, Result, ServiceDependencies};

/// 通知を作成する
///
/// 未送信の通知を保存し、`send_immediately`が指定されていれば
/// そのまま通知チャネルへ配信する。
/// 配信に失敗しても通知は未送信のまま残り、エラーにはしない。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 通知作成コマンド
///
/// # 戻り値
/// 保存された通知（即時送信できた場合は送信済みの状態）
pub async fn create_notification(
    deps: &ServiceDependencies,
    cmd: CreateNotification,
) -> Result<Notification> {
    // 1. ドメイン層の純粋関数で未送信の通知を作成
    let notification =
        domain::notification::new_notification(cmd.user_id, cmd.message, cmd.book_id, cmd.created_at);

    // 2. 保存
    deps.notification_repository
        .insert(&notification)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?;

    tracing::debug!(
        notification_id = %notification.id,
        user_id = %notification.user_id,
        "Notification created"
    );

    // 3. 即時送信
    if cmd.send_immediately {
        return deliver_or_defer(deps, &notification, cmd.created_at).await;
    }

    Ok(notification)
}

/// 通知チャネルへ配信し、送信済みとして保存する
///
/// 配信に失敗した場合は未送信のまま残る。
async fn deliver(
    deps: &ServiceDependencies,
    notification: &Notification,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let sent = match domain::notification::mark_sent(notification, now) {
        Ok(sent) => sent,
        Err(domain::MarkSentError::AlreadySent) => return Ok(notification.clone()),
    };

    deps.notification_channel
        .deliver(notification)
        .await
        .map_err(LibraryApplicationError::NotificationChannelError)?;

    deps.notification_repository
        .save(&sent)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?;

    Ok(sent)
}

/// 配信を試み、チャネルの失敗は警告だけ残して未送信のまま返す
async fn deliver_or_defer(
    deps: &ServiceDependencies,
    notification: &Notification,
    now: DateTime<Utc>,
) -> Result<Notification> {
    match deliver(deps, notification, now).await {
        Err(LibraryApplicationError::NotificationChannelError(e)) => {
            tracing::warn!(
                notification_id = %notification.id,
                "Failed to deliver notification: {}",
                e
            );
            Ok(notification.clone())
        }
        other => other,
    }
}

/// 通知を1件送信する
///
/// 既に送信済みの通知はそのまま返す（再送しない）。
pub async fn send_notification(
    deps: &ServiceDependencies,
    notification_id: NotificationId,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let notification = get_notification(deps, notification_id).await?;
    deliver(deps, &notification, now).await
}

/// 未送信の通知をすべて送信する
///
/// 外部から定期的に呼び出される想定のバッチ。
/// 配信に失敗した通知は未送信のまま残し、処理を続ける。
///
/// # 戻り値
/// 送信できた件数
pub async fn send_notifications(deps: &ServiceDependencies, now: DateTime<Utc>) -> Result<usize> {
    let pending = deps
        .notification_repository
        .find_unsent()
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?;

    let mut sent_count = 0;

    for notification in &pending {
        if deliver_or_defer(deps, notification, now).await?.is_sent {
            sent_count += 1;
        }
    }

    tracing::info!(sent = sent_count, pending = pending.len(), "Notification sweep finished");

    Ok(sent_count)
}

/// 書籍に紐づく未送信の通知をすべて送信する
///
/// 配信に失敗した通知は未送信のまま残る。
pub async fn send_unsent_for_book(
    deps: &ServiceDependencies,
    book_id: BookId,
    now: DateTime<Utc>,
) -> Result<usize> {
    let pending = deps
        .notification_repository
        .find_unsent_for_book(book_id)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?;

    let mut sent_count = 0;
    for notification in &pending {
        if deliver_or_defer(deps, notification, now).await?.is_sent {
            sent_count += 1;
        }
    }

    Ok(sent_count)
}

/// 配信せずに送信済みにする
pub async fn mark_notification_as_sent(
    deps: &ServiceDependencies,
    notification_id: NotificationId,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let notification = get_notification(deps, notification_id).await?;

    let sent = match domain::notification::mark_sent(&notification, now) {
        Ok(sent) => sent,
        Err(domain::MarkSentError::AlreadySent) => return Ok(notification),
    };

    deps.notification_repository
        .save(&sent)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?;

    Ok(sent)
}

/// 通知を削除する
pub async fn delete_notification(
    deps: &ServiceDependencies,
    notification_id: NotificationId,
) -> Result<()> {
    let deleted = deps
        .notification_repository
        .delete(notification_id)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?;

    if !deleted {
        return Err(LibraryApplicationError::NotificationNotFound);
    }

    Ok(())
}

pub async fn get_notification(
    deps: &ServiceDependencies,
    notification_id: NotificationId,
) -> Result<Notification> {
    deps.notification_repository
        .get_by_id(notification_id)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)?
        .ok_or(LibraryApplicationError::NotificationNotFound)
}

/// 利用者の未送信通知（新しい順）
pub async fn get_user_notifications(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<Notification>> {
    deps.notification_repository
        .find_unsent_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)
}

/// すべての未送信通知（管理者向け）
pub async fn get_unsent_notifications(deps: &ServiceDependencies) -> Result<Vec<Notification>> {
    deps.notification_repository
        .find_unsent()
        .await
        .map_err(LibraryApplicationError::NotificationRepositoryError)
}
