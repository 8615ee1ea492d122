use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Book, BookId, CancelReservationError, ReservationId, ReserveBookError, UserId};

/// 予約の有効期間（日数）
pub const RESERVATION_WINDOW_DAYS: i64 = 1;

/// 予約 - 利用者が書籍に対して置く取り置き
///
/// 書籍ごとに`reservation_date`の昇順で並ぶ待ち行列を構成する。
/// 同じ(利用者, 書籍)の未取消の予約は高々1件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub reservation_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub is_canceled: bool,
}

impl Reservation {
    /// 有効な予約か（未取消かつ期限内）
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_canceled && self.expiry_date >= now
    }
}

/// 書籍を予約する（純粋関数）
///
/// ビジネスルール：
/// - 貸出可能な書籍は予約できない（そのまま借りればよい）
/// - 自分が借りている書籍は予約できない
/// - 同じ書籍への未取消の予約は1件まで
/// - 有効期限 = 予約日時 + 1日
///
/// 予約すると書籍は貸出可能プールから外れる。
pub fn reserve_book(
    book: &Book,
    user_id: UserId,
    reserved_at: DateTime<Utc>,
    existing: Option<&Reservation>,
    borrowing: bool,
) -> Result<(Reservation, Book), ReserveBookError> {
    if book.is_available {
        return Err(ReserveBookError::BookAvailable);
    }

    if borrowing {
        return Err(ReserveBookError::AlreadyBorrowing);
    }

    if existing.is_some_and(|r| !r.is_canceled) {
        return Err(ReserveBookError::AlreadyReserved);
    }

    let reservation = Reservation {
        id: ReservationId::new(),
        user_id,
        book_id: book.id,
        reservation_date: reserved_at,
        expiry_date: reserved_at + Duration::days(RESERVATION_WINDOW_DAYS),
        is_canceled: false,
    };

    let book = Book {
        is_available: false,
        ..book.clone()
    };

    Ok((reservation, book))
}

/// 予約を取り消す（純粋関数）
pub fn cancel_reservation(
    reservation: &Reservation,
) -> Result<Reservation, CancelReservationError> {
    if reservation.is_canceled {
        return Err(CancelReservationError::AlreadyCanceled);
    }

    Ok(Reservation {
        is_canceled: true,
        ..reservation.clone()
    })
}

/// 書籍を予約者のために確保する（純粋関数）
///
/// 確保した時点から有効期間をやり直し、受け取りの猶予を与える。
pub fn hold_for(
    reservation: &Reservation,
    book: &Book,
    held_at: DateTime<Utc>,
) -> (Reservation, Book) {
    let reservation = Reservation {
        expiry_date: held_at + Duration::days(RESERVATION_WINDOW_DAYS),
        ..reservation.clone()
    };

    let book = Book {
        is_available: false,
        ..book.clone()
    };

    (reservation, book)
}

/// 待ち行列の先頭を選ぶ
///
/// 対象書籍の有効な予約のうち`reservation_date`が最も古いもの。
/// 期限切れ・取消済み・`excluding`は除外する。同時刻はIDで順序を決める。
pub fn next_in_queue<'a>(
    reservations: impl IntoIterator<Item = &'a Reservation>,
    book_id: BookId,
    now: DateTime<Utc>,
    excluding: Option<ReservationId>,
) -> Option<&'a Reservation> {
    reservations
        .into_iter()
        .filter(|r| r.book_id == book_id && r.is_active(now) && Some(r.id) != excluding)
        .min_by_key(|r| (r.reservation_date, r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BookDetails;

    fn unavailable_book() -> Book {
        let mut book = Book::new(BookDetails {
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            publication_year: 1949,
            category: None,
            isbn: None,
            description: None,
            cover_image: None,
        });
        book.is_available = false;
        book
    }

    #[test]
    fn test_reserve_book_sets_one_day_expiry() {
        let book = unavailable_book();
        let user_id = UserId::new();
        let now = Utc::now();

        let (reservation, book) = reserve_book(&book, user_id, now, None, false).unwrap();

        assert_eq!(reservation.reservation_date, now);
        assert_eq!(reservation.expiry_date, now + Duration::days(1));
        assert_eq!(reservation.user_id, user_id);
        assert!(!reservation.is_canceled);
        assert!(!book.is_available);
    }

    #[test]
    fn test_reserve_book_fails_when_available() {
        let mut book = unavailable_book();
        book.is_available = true;

        let result = reserve_book(&book, UserId::new(), Utc::now(), None, false);
        assert_eq!(result.unwrap_err(), ReserveBookError::BookAvailable);
    }

    #[test]
    fn test_reserve_book_fails_when_already_reserved() {
        let book = unavailable_book();
        let user_id = UserId::new();
        let now = Utc::now();
        let (existing, _) = reserve_book(&book, user_id, now, None, false).unwrap();

        let result = reserve_book(&book, user_id, now, Some(&existing), false);
        assert_eq!(result.unwrap_err(), ReserveBookError::AlreadyReserved);
    }

    #[test]
    fn test_reserve_book_fails_for_current_borrower() {
        let result = reserve_book(&unavailable_book(), UserId::new(), Utc::now(), None, true);
        assert_eq!(result.unwrap_err(), ReserveBookError::AlreadyBorrowing);
    }

    #[test]
    fn test_cancel_reservation_only_once() {
        let (reservation, _) =
            reserve_book(&unavailable_book(), UserId::new(), Utc::now(), None, false).unwrap();

        let canceled = cancel_reservation(&reservation).unwrap();
        assert!(canceled.is_canceled);
        assert_eq!(
            cancel_reservation(&canceled).unwrap_err(),
            CancelReservationError::AlreadyCanceled
        );
    }

    #[test]
    fn test_is_active_excludes_expired_and_canceled() {
        let now = Utc::now();
        let (reservation, _) =
            reserve_book(&unavailable_book(), UserId::new(), now, None, false).unwrap();

        assert!(reservation.is_active(now));
        assert!(reservation.is_active(now + Duration::days(1)));
        assert!(!reservation.is_active(now + Duration::days(1) + Duration::seconds(1)));
        assert!(!cancel_reservation(&reservation).unwrap().is_active(now));
    }

    #[test]
    fn test_hold_for_restarts_expiry() {
        let book = unavailable_book();
        let now = Utc::now();
        let (reservation, _) =
            reserve_book(&book, UserId::new(), now - Duration::hours(20), None, false).unwrap();

        let (held, book) = hold_for(&reservation, &book, now);
        assert_eq!(held.expiry_date, now + Duration::days(1));
        assert_eq!(held.reservation_date, reservation.reservation_date);
        assert!(!book.is_available);
    }

    #[test]
    fn test_next_in_queue_orders_by_reservation_date() {
        let book = unavailable_book();
        let now = Utc::now();
        let (first, _) =
            reserve_book(&book, UserId::new(), now - Duration::hours(3), None, false).unwrap();
        let (second, _) =
            reserve_book(&book, UserId::new(), now - Duration::hours(2), None, false).unwrap();
        let (third, _) =
            reserve_book(&book, UserId::new(), now - Duration::hours(1), None, false).unwrap();
        let all = vec![third.clone(), first.clone(), second.clone()];

        assert_eq!(next_in_queue(&all, book.id, now, None), Some(&first));
        assert_eq!(next_in_queue(&all, book.id, now, Some(first.id)), Some(&second));
    }

    #[test]
    fn test_next_in_queue_skips_expired_canceled_and_other_books() {
        let book = unavailable_book();
        let other = unavailable_book();
        let now = Utc::now();
        let (expired, _) =
            reserve_book(&book, UserId::new(), now - Duration::days(3), None, false).unwrap();
        let (canceled, _) =
            reserve_book(&book, UserId::new(), now - Duration::hours(5), None, false).unwrap();
        let canceled = cancel_reservation(&canceled).unwrap();
        let (elsewhere, _) =
            reserve_book(&other, UserId::new(), now - Duration::hours(4), None, false).unwrap();
        let (waiting, _) =
            reserve_book(&book, UserId::new(), now - Duration::hours(1), None, false).unwrap();
        let all = vec![expired, canceled, elsewhere, waiting.clone()];

        assert_eq!(next_in_queue(&all, book.id, now, None), Some(&waiting));
        assert_eq!(next_in_queue(&all, book.id, now, Some(waiting.id)), None);
    }
}
