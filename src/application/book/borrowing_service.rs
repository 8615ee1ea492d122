use crate::domain::{
    self, BookId, BorrowedBook, Reservation, ReserveBookError, UserId,
    commands::{BorrowBook, CreateNotification, ReserveBook, ReturnBook},
    notification::messages,
};

use crate::application::{
    LibraryApplicationError, Result, ServiceDependencies,
    notification::{create_notification, send_unsent_for_book},
    reservation::{QueueAdvance, get_reservation_by_user_by_book, promote_next_in_queue, release_expired},
};

use super::catalog::get_book;

async fn ensure_user_exists(deps: &ServiceDependencies, user_id: UserId) -> Result<()> {
    deps.user_repository
        .get_by_id(user_id)
        .await
        .map_err(LibraryApplicationError::UserRepositoryError)?
        .ok_or(LibraryApplicationError::UserNotFound)?;
    Ok(())
}

async fn is_on_loan(deps: &ServiceDependencies, book_id: BookId) -> Result<bool> {
    Ok(deps
        .borrow_repository
        .find_open_for_book(book_id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?
        .is_some())
}

/// 書籍を借りる
///
/// ビジネスルール：
/// - 書籍・利用者が存在すること
/// - 書籍が貸出可能であること、または自分が予約待ち行列の先頭であること
/// - 他の利用者が借りていないこと
/// - 貸出日数は1日以上
///
/// 貸出後は書籍を貸出不可にし、利用者の予約があれば削除する。
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 貸出コマンド
///
/// # 戻り値
/// 作成された貸出記録（返却期限 = 貸出日時 + 日数）
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<BorrowedBook> {
    // 1. 書籍・利用者の存在確認
    let book = get_book(deps, cmd.book_id).await?;
    ensure_user_exists(deps, cmd.user_id).await?;

    // 2. 貸出状況と待ち行列の先頭を確認
    let on_loan = is_on_loan(deps, book.id).await?;

    let queue_head = deps
        .reservation_repository
        .find_next_active(book.id, cmd.borrowed_at, None)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    // 3. ドメイン層の純粋関数を呼び出し
    let (borrowed, book) = domain::borrowing::borrow_book(
        &book,
        cmd.user_id,
        cmd.borrowed_at,
        cmd.days,
        on_loan,
        queue_head.as_ref(),
    )?;

    // 4. 貸出記録と書籍を保存
    deps.borrow_repository
        .insert(&borrowed)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?;

    deps.book_repository
        .save(&book)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    // 5. 利用者の予約を消化
    if let Some(reservation) = get_reservation_by_user_by_book(deps, cmd.user_id, book.id).await? {
        deps.reservation_repository
            .delete(reservation.id)
            .await
            .map_err(LibraryApplicationError::ReservationRepositoryError)?;
        tracing::debug!(reservation_id = %reservation.id, "Reservation fulfilled by borrow");
    }

    tracing::info!(
        borrow_id = %borrowed.id,
        book_id = %borrowed.book_id,
        user_id = %borrowed.user_id,
        due_date = %borrowed.due_date,
        "Book borrowed"
    );

    Ok(borrowed)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 利用者がその書籍を借りていること（なければ何も変更せずにエラー）
/// - 延滞していても返却は受け付ける
///
/// 返却後の流れ：
/// 1. 返却した利用者に「返却完了」を通知
/// 2. 予約待ちがいれば先頭のために確保して通知
/// 3. 誰も待っていなければ貸出可能に戻し、入荷通知の希望者へ未送信の通知を送る
///
/// # 引数
/// * `deps` - サービスの依存関係
/// * `cmd` - 返却コマンド
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<BorrowedBook> {
    // 1. 未返却の貸出記録を取得
    let open = deps
        .borrow_repository
        .find_open(cmd.user_id, cmd.book_id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?
        .ok_or(LibraryApplicationError::BorrowNotFoundOrReturned)?;

    let book = get_book(deps, cmd.book_id).await?;

    // 2. ドメイン層の純粋関数を呼び出し
    let (returned, book) = domain::borrowing::return_book(&open, &book, cmd.returned_at)?;

    // 3. 貸出記録を保存
    deps.borrow_repository
        .save(&returned)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?;

    tracing::info!(
        borrow_id = %returned.id,
        book_id = %returned.book_id,
        user_id = %returned.user_id,
        "Book returned"
    );

    // 4. 返却した利用者へ通知
    create_notification(
        deps,
        CreateNotification {
            user_id: cmd.user_id,
            message: messages::book_returned(&book.title, cmd.returned_at),
            book_id: Some(book.id),
            send_immediately: true,
            created_at: cmd.returned_at,
        },
    )
    .await?;

    // 5. 待ち行列を進める（書籍の状態もここで保存される）
    let next = promote_next_in_queue(deps, &book, cmd.returned_at, QueueAdvance::Returned).await?;

    // 6. 誰も待っていなければ入荷通知を送る
    if next.is_none() {
        send_unsent_for_book(deps, book.id, cmd.returned_at).await?;
    }

    Ok(returned)
}

/// 書籍を予約する
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 書籍が貸出不可であること（貸出可能ならそのまま借りる）
/// - 自分が借りている書籍ではないこと
/// - 同じ書籍への有効な予約は1件まで
///
/// 予約の有効期限は予約日時 + 1日。期限切れの古い予約は先に解放する。
///
/// 書籍が貸出可能なために予約できず、`notify_when_available`が指定されていれば、
/// 未送信の入荷通知を残したうえでエラーを返す。
pub async fn reserve_book(deps: &ServiceDependencies, cmd: ReserveBook) -> Result<Reservation> {
    // 1. 書籍の存在確認
    let book = get_book(deps, cmd.book_id).await?;
    ensure_user_exists(deps, cmd.user_id).await?;

    // 2. 期限切れの自分の予約を解放
    let existing = get_reservation_by_user_by_book(deps, cmd.user_id, book.id).await?;

    let (book, existing) = match existing {
        Some(reservation) if !reservation.is_active(cmd.reserved_at) => {
            release_expired(deps, &reservation, cmd.reserved_at).await?;
            (get_book(deps, book.id).await?, None)
        }
        other => (book, other),
    };

    // 3. 自分が借りているか確認
    let borrowing = deps
        .borrow_repository
        .find_open(cmd.user_id, book.id)
        .await
        .map_err(LibraryApplicationError::BorrowRepositoryError)?
        .is_some();

    // 4. ドメイン層の純粋関数を呼び出し
    let (reservation, book) = match domain::reservation::reserve_book(
        &book,
        cmd.user_id,
        cmd.reserved_at,
        existing.as_ref(),
        borrowing,
    ) {
        Ok(result) => result,
        Err(ReserveBookError::BookAvailable) if cmd.notify_when_available => {
            create_notification(
                deps,
                CreateNotification {
                    user_id: cmd.user_id,
                    message: messages::notify_when_available(&book.title),
                    book_id: Some(book.id),
                    send_immediately: false,
                    created_at: cmd.reserved_at,
                },
            )
            .await?;
            tracing::debug!(book_id = %book.id, user_id = %cmd.user_id, "Availability notification queued");
            return Err(ReserveBookError::BookAvailable.into());
        }
        Err(e) => return Err(e.into()),
    };

    // 5. 予約と書籍を保存
    deps.reservation_repository
        .insert(&reservation)
        .await
        .map_err(LibraryApplicationError::ReservationRepositoryError)?;

    deps.book_repository
        .save(&book)
        .await
        .map_err(LibraryApplicationError::BookRepositoryError)?;

    tracing::info!(
        reservation_id = %reservation.id,
        book_id = %reservation.book_id,
        user_id = %reservation.user_id,
        expiry_date = %reservation.expiry_date,
        "Book reserved"
    );

    Ok(reservation)
}
