use chrono::{DateTime, Utc};

use crate::domain::{
    self, Book, BookId, Reservation, ReservationId, UserId,
    commands::{CancelReservation, CreateNotification},
    notification::messages,
};

use crate::application::{
    LibraryApplicationError, Result, ServiceDependencies, notification::create_notification,
};

/// 待ち行列が進む理由
///
/// 理由によって次の予約者への通知文と、確保をやり直すかが変わる。
#[derive(Debug, Clone, Copy)]
pub enum QueueAdvance<'a> {
    /// 書籍が返却された
    Returned,
    /// 予約が取り消された
    Canceled(&'a Reservation),
    /// 予約が期限切れになった
    Expired(&'a Reservation),
}

/// 書籍の待ち行列を1つ進める
///
/// 予約の取消・期限切れ・返却のすべてから呼ばれる唯一の窓口。
///
/// 処理内容：
/// - 書籍が貸出中でなく、先頭が入れ替わった場合は新しい先頭のために確保し直す
/// - 次の予約者に通知する（取消なら「繰り上がり」、確保なら「貸出可能」）
///   取消では先頭以外の予約が消えても先頭に「繰り上がり」を送る
/// - 通知の配信失敗では失敗しない（書籍と予約の状態は保存済み）
/// - 有効な予約も貸出もなければ書籍を貸出可能に戻す
///
/// `book`は呼び出し側が持つ最新の状態。結果の状態は必ず保存される。
///
/// # 戻り値
/// 次の予約者の予約（いなければ`None`）
pub async fn promote_next_in_queue(
    deps: &ServiceDependencies,
    book: &Book,
    now: DateTime<Utc>,
    advance: QueueAdvance<'_>,
) -> Result<Option<Reservation>> {
    // 1. 貸出中か確認
    let on_loan = deps
        .borrow_repository
        .find_open_for_book(book.id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?
        .is_some();

    // 2. 次の予約者を取得（期限切れ・取消済みは除外）
    let excluding = match advance {
        QueueAdvance::Returned => None,
        QueueAdvance::Canceled(r) | QueueAdvance::Expired(r) => Some(r.id),
    };

    let next = deps
        .reservation_repository
        .find_next_active(book.id, now, excluding)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    let Some(next) = next else {
        // 3a. 誰も待っていない
        if !on_loan {
            let released = Book {
                is_available: true,
                ..book.clone()
            };
            save_book(deps, &released).await?;
            tracing::info!(book_id = %book.id, "Book returned to the available pool");
        } else {
            save_book(deps, book).await?;
        }
        return Ok(None);
    };

    // 3b. 先頭が入れ替わったか（返却は常に入れ替わり扱い）
    let head_changed = match advance {
        QueueAdvance::Returned => true,
        QueueAdvance::Canceled(r) | QueueAdvance::Expired(r) => {
            (r.reservation_date, r.id) < (next.reservation_date, next.id)
        }
    };

    let held = !on_loan && head_changed;

    let next = if held {
        let (reservation, book) = domain::reservation::hold_for(&next, book, now);
        deps.reservation_repository
            .save(&reservation)
            .await
            .map_err(LibraryApplicationError::ReservationRepositoryError)?;
        save_book(deps, &book).await?;
        tracing::info!(
            book_id = %book.id,
            reservation_id = %reservation.id,
            user_id = %reservation.user_id,
            "Book held for next reservation"
        );
        reservation
    } else {
        save_book(deps, book).await?;
        next
    };

    // 4. 次の予約者へ通知
    let message = match advance {
        QueueAdvance::Canceled(_) => Some(messages::moved_up_in_queue(&book.title)),
        QueueAdvance::Returned | QueueAdvance::Expired(_) if held => {
            Some(messages::reserved_book_available(&book.title))
        }
        _ => None,
    };

    if let Some(message) = message {
        create_notification(
            deps,
            CreateNotification {
                user_id: next.user_id,
                message,
                book_id: Some(book.id),
                send_immediately: true,
                created_at: now,
            },
        )
        .await?;
    }

    Ok(Some(next))
}

async fn save_book(deps: &ServiceDependencies, book: &Book) -> Result<()> {
    deps.book_repository
        .save(book)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)
}

async fn load_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.book_repository
        .get_by_id(book_id)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?
        .ok_or(LibraryApplicationError::BookNotFound)
}

/// 予約を取り消す
///
/// ビジネスルール：
/// - 予約が存在すること
/// - 本人の予約であること（管理者は他人の予約も取り消せる）
/// - 取消済みでないこと
///
/// 取り消した利用者に通知し、待ち行列を進める。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 予約取消コマンド
///
/// # 戻り値
/// 取消済みの予約
pub async fn cancel_reservation(
    deps: &ServiceDependencies,
    cmd: CancelReservation,
) -> Result<Reservation> {
    // 1. 予約を取得
    let reservation = get_reservation(deps, cmd.reservation_id).await?;

    // 2. 権限確認
    if reservation.user_id != cmd.requested_by && !cmd.requested_by_admin {
        return Err(LibraryApplicationError::Forbidden(
            "cancel this reservation".to_string(),
        ));
    }

    // 3. ドメイン層の純粋関数を呼び出し
    let canceled = domain::reservation::cancel_reservation(&reservation)?;

    // 4. 保存
    deps.reservation_repository
        .save(&canceled)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    tracing::info!(
        reservation_id = %canceled.id,
        book_id = %canceled.book_id,
        user_id = %canceled.user_id,
        "Reservation canceled"
    );

    // 5. 取り消した利用者へ通知
    let book = load_book(deps, canceled.book_id).await?;

    create_notification(
        deps,
        CreateNotification {
            user_id: canceled.user_id,
            message: messages::reservation_canceled(&book.title),
            book_id: Some(book.id),
            send_immediately: true,
            created_at: cmd.canceled_at,
        },
    )
    .await?;

    // 6. 待ち行列を進める
    promote_next_in_queue(deps, &book, cmd.canceled_at, QueueAdvance::Canceled(&canceled)).await?;

    Ok(canceled)
}

/// 期限切れの予約を解放する
///
/// 外部から定期的に呼び出される想定のバッチ。
/// 期限切れの予約を取消扱いにし、予約者へ通知して待ち行列を進める。
/// 取消済みになるため、繰り返し実行しても同じ予約は二度処理されない。
///
/// # 戻り値
/// 解放した予約の件数
pub async fn release_expired_reservations(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<usize> {
    let reservations = deps
        .reservation_repository
        .find_not_canceled()
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    let mut released_count = 0;

    for reservation in reservations.iter().filter(|r| !r.is_active(now)) {
        release_expired(deps, reservation, now).await?;
        released_count += 1;
    }

    if released_count > 0 {
        tracing::info!(released = released_count, "Expired reservations released");
    }

    Ok(released_count)
}

/// 期限切れの予約を1件解放する
pub(crate) async fn release_expired(
    deps: &ServiceDependencies,
    reservation: &Reservation,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let expired = domain::reservation::cancel_reservation(reservation)?;

    deps.reservation_repository
        .save(&expired)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    let book = load_book(deps, expired.book_id).await?;

    create_notification(
        deps,
        CreateNotification {
            user_id: expired.user_id,
            message: messages::reservation_expired(&book.title),
            book_id: Some(book.id),
            send_immediately: true,
            created_at: now,
        },
    )
    .await?;

    promote_next_in_queue(deps, &book, now, QueueAdvance::Expired(&expired)).await?;

    Ok(expired)
}

/// 予約を直接登録する（管理者向け）
///
/// 待ち行列の規則は適用しない。利用者・書籍の存在のみ確認する。
pub async fn add_reservation(
    deps: &ServiceDependencies,
    reservation: Reservation,
) -> Result<Reservation> {
    load_book(deps, reservation.book_id).await?;

    deps.user_repository
        .get_by_id(reservation.user_id)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)?;

    deps.reservation_repository
        .insert(&reservation)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    Ok(reservation)
}

pub async fn get_reservation(
    deps: &ServiceDependencies,
    reservation_id: ReservationId,
) -> Result<Reservation> {
    deps.reservation_repository
        .get_by_id(reservation_id)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?
        .ok_or(LibraryApplicationError::ReservationNotFound)
}

/// 予約を上書き保存する（管理者向け）
pub async fn update_reservation(
    deps: &ServiceDependencies,
    reservation: Reservation,
) -> Result<Reservation> {
    get_reservation(deps, reservation.id).await?;

    deps.reservation_repository
        .save(&reservation)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    Ok(reservation)
}

pub async fn delete_reservation(
    deps: &ServiceDependencies,
    reservation_id: ReservationId,
) -> Result<()> {
    let deleted = deps
        .reservation_repository
        .delete(reservation_id)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    if !deleted {
        return Err(LibraryApplicationError::ReservationNotFound);
    }

    Ok(())
}

/// すべての予約（新しい順）
pub async fn get_all_reservations(deps: &ServiceDependencies) -> Result<Vec<Reservation>> {
    deps.reservation_repository
        .find_all()
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)
}

pub async fn get_user_reservations(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<Reservation>> {
    deps.reservation_repository
        .find_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)
}

/// 利用者が書籍に持っている未取消の予約
///
/// 貸出時に予約の有無を確認するために使用される。
pub async fn get_reservation_by_user_by_book(
    deps: &ServiceDependencies,
    user_id: UserId,
    book_id: BookId,
) -> Result<Option<Reservation>> {
    deps.reservation_repository
        .find_by_user_and_book(user_id, book_id)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)
}

/// 未取消の予約一覧（予約日時の古い順）
pub async fn get_reserved_books(deps: &ServiceDependencies) -> Result<Vec<Reservation>> {
    deps.reservation_repository
        .find_not_canceled()
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)
}
