use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Book, BookId, BorrowBookError, BorrowId, ReturnBookError, UserId, reservation::Reservation,
};

/// 返却期限間近とみなす日数（今日を含めて3日後まで）
pub const ALMOST_DUE_WINDOW_DAYS: i64 = 3;

/// 貸出ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorrowStatus {
    /// 貸出中
    Borrowed,
    /// 延滞中（延滞検出バッチで遷移）
    Overdue,
    /// 返却済み
    Returned,
}

impl BorrowStatus {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Overdue => "overdue",
            BorrowStatus::Returned => "returned",
        }
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(BorrowStatus::Borrowed),
            "overdue" => Ok(BorrowStatus::Overdue),
            "returned" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

/// 貸出記録 - 1冊の書籍の1回の貸出
///
/// `return_date`が`None`の間は「未返却」。
/// 同じ(利用者, 書籍)の未返却レコードは常に高々1件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedBook {
    pub id: BorrowId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
}

impl BorrowedBook {
    /// 未返却か
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// 書籍を貸し出す（純粋関数）
///
/// ビジネスルール：
/// - 貸出日数は1日以上（返却期限が表現できない日数も不可）
/// - 他の未返却の貸出がある書籍は貸し出せない
/// - 予約の先頭が自分なら、書籍が確保中でも貸出できる
/// - 先頭が他の利用者なら貸出不可
/// - 予約がなければ`is_available`に従う
///
/// 返却期限 = 貸出日時 + 日数。
/// 副作用なし。新しい貸出記録と更新後のBookを返す。
pub fn borrow_book(
    book: &Book,
    user_id: UserId,
    borrowed_at: DateTime<Utc>,
    days: i64,
    on_loan: bool,
    queue_head: Option<&Reservation>,
) -> Result<(BorrowedBook, Book), BorrowBookError> {
    if days < 1 {
        return Err(BorrowBookError::InvalidPeriod);
    }

    let due_date = Duration::try_days(days)
        .and_then(|period| borrowed_at.checked_add_signed(period))
        .ok_or(BorrowBookError::InvalidPeriod)?;

    if on_loan {
        return Err(BorrowBookError::NotAvailable);
    }

    let permitted = match queue_head {
        Some(reservation) => reservation.user_id == user_id,
        None => book.is_available,
    };

    if !permitted {
        return Err(BorrowBookError::NotAvailable);
    }

    let borrowed = BorrowedBook {
        id: BorrowId::new(),
        user_id,
        book_id: book.id,
        borrow_date: borrowed_at,
        due_date,
        return_date: None,
        status: BorrowStatus::Borrowed,
    };

    let book = Book {
        is_available: false,
        ..book.clone()
    };

    Ok((borrowed, book))
}

/// 書籍を返却する（純粋関数）
///
/// 延滞していても返却は受け付ける。
/// 書籍は貸出可能に戻る。予約待ちへの確保はアプリケーション層で行う。
pub fn return_book(
    borrowed: &BorrowedBook,
    book: &Book,
    returned_at: DateTime<Utc>,
) -> Result<(BorrowedBook, Book), ReturnBookError> {
    if !borrowed.is_open() {
        return Err(ReturnBookError::AlreadyReturned);
    }

    let borrowed = BorrowedBook {
        return_date: Some(returned_at),
        status: BorrowStatus::Returned,
        ..borrowed.clone()
    };

    let book = Book {
        is_available: true,
        ..book.clone()
    };

    Ok((borrowed, book))
}

/// その日の0時（UTC）
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 延滞の判定基準：今日の0時より前が返却期限なら延滞
pub fn overdue_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now)
}

/// 返却期限間近の範囲 `[今日0時, 今日0時 + 4日)`
pub fn almost_due_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = start_of_day(now);
    (today, today + Duration::days(ALMOST_DUE_WINDOW_DAYS + 1))
}

/// 延滞判定
pub fn is_overdue(borrowed: &BorrowedBook, now: DateTime<Utc>) -> bool {
    borrowed.is_open() && borrowed.due_date < overdue_cutoff(now)
}

/// 返却期限間近判定（延滞は含まない）
pub fn is_almost_due(borrowed: &BorrowedBook, now: DateTime<Utc>) -> bool {
    let (from, to) = almost_due_window(now);
    borrowed.is_open() && borrowed.due_date >= from && borrowed.due_date < to
}

/// 延滞状態に遷移させる
///
/// 未返却かつ延滞しており、まだBorrowed状態のものだけが対象。
/// 対象外なら`None`（延滞検出バッチの重複処理防止）。
pub fn mark_overdue(borrowed: &BorrowedBook, now: DateTime<Utc>) -> Option<BorrowedBook> {
    if borrowed.status != BorrowStatus::Borrowed || !is_overdue(borrowed, now) {
        return None;
    }

    Some(BorrowedBook {
        status: BorrowStatus::Overdue,
        ..borrowed.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookDetails, ReservationId};
    use chrono::TimeZone;

    fn book() -> Book {
        Book::new(BookDetails {
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            publication_year: 1949,
            category: None,
            isbn: None,
            description: None,
            cover_image: None,
        })
    }

    fn reservation_for(book: &Book, user_id: UserId, at: DateTime<Utc>) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            user_id,
            book_id: book.id,
            reservation_date: at,
            expiry_date: at + Duration::days(1),
            is_canceled: false,
        }
    }

    #[test]
    fn test_borrow_book_sets_due_date_exactly() {
        let book = book();
        let user_id = UserId::new();
        let now = Utc::now();

        let (borrowed, book) = borrow_book(&book, user_id, now, 14, false, None).unwrap();

        assert_eq!(borrowed.due_date, borrowed.borrow_date + Duration::days(14));
        assert_eq!(borrowed.borrow_date, now);
        assert_eq!(borrowed.status, BorrowStatus::Borrowed);
        assert!(borrowed.is_open());
        assert!(!book.is_available);
    }

    #[test]
    fn test_borrow_book_rejects_non_positive_period() {
        let result = borrow_book(&book(), UserId::new(), Utc::now(), 0, false, None);
        assert_eq!(result.unwrap_err(), BorrowBookError::InvalidPeriod);
    }

    #[test]
    fn test_borrow_book_rejects_unrepresentable_due_date() {
        let book = book();

        for days in [i64::MAX / 1000, 1_000_000_000] {
            let result = borrow_book(&book, UserId::new(), Utc::now(), days, false, None);
            assert_eq!(result.unwrap_err(), BorrowBookError::InvalidPeriod);
        }
    }

    #[test]
    fn test_borrow_book_fails_when_unavailable_without_reservation() {
        let mut book = book();
        book.is_available = false;

        let result = borrow_book(&book, UserId::new(), Utc::now(), 7, false, None);
        assert_eq!(result.unwrap_err(), BorrowBookError::NotAvailable);
    }

    #[test]
    fn test_borrow_book_allowed_for_queue_head() {
        let mut book = book();
        book.is_available = false;
        let user_id = UserId::new();
        let now = Utc::now();
        let reservation = reservation_for(&book, user_id, now);

        let result = borrow_book(&book, user_id, now, 7, false, Some(&reservation));
        assert!(result.is_ok());
    }

    #[test]
    fn test_borrow_book_refused_when_held_for_someone_else() {
        let book = book();
        let now = Utc::now();
        let reservation = reservation_for(&book, UserId::new(), now);

        let result = borrow_book(&book, UserId::new(), now, 7, false, Some(&reservation));
        assert_eq!(result.unwrap_err(), BorrowBookError::NotAvailable);
    }

    #[test]
    fn test_borrow_book_refused_while_on_loan_even_for_queue_head() {
        let book = book();
        let user_id = UserId::new();
        let now = Utc::now();
        let reservation = reservation_for(&book, user_id, now);

        let result = borrow_book(&book, user_id, now, 7, true, Some(&reservation));
        assert_eq!(result.unwrap_err(), BorrowBookError::NotAvailable);
    }

    #[test]
    fn test_return_book_success() {
        let now = Utc::now();
        let (borrowed, book) = borrow_book(&book(), UserId::new(), now, 7, false, None).unwrap();
        let returned_at = now + Duration::days(3);

        let (returned, book) = return_book(&borrowed, &book, returned_at).unwrap();

        assert_eq!(returned.return_date, Some(returned_at));
        assert_eq!(returned.status, BorrowStatus::Returned);
        assert!(book.is_available);
    }

    #[test]
    fn test_return_book_fails_when_already_returned() {
        let now = Utc::now();
        let (borrowed, book) = borrow_book(&book(), UserId::new(), now, 7, false, None).unwrap();
        let (returned, book) = return_book(&borrowed, &book, now).unwrap();

        let result = return_book(&returned, &book, now + Duration::days(1));
        assert_eq!(result.unwrap_err(), ReturnBookError::AlreadyReturned);
    }

    #[test]
    fn test_overdue_means_due_before_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let (mut borrowed, _) =
            borrow_book(&book(), UserId::new(), now - Duration::days(10), 7, false, None)
                .unwrap();

        // 期限は3月7日15時 → 延滞
        assert!(is_overdue(&borrowed, now));

        // 今日の早朝が期限 → まだ延滞ではない
        borrowed.due_date = Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();
        assert!(!is_overdue(&borrowed, now));
        assert!(is_almost_due(&borrowed, now));
    }

    #[test]
    fn test_almost_due_window_is_three_days_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let (mut borrowed, _) =
            borrow_book(&book(), UserId::new(), now, 1, false, None).unwrap();

        borrowed.due_date = Utc.with_ymd_and_hms(2024, 3, 13, 23, 59, 0).unwrap();
        assert!(is_almost_due(&borrowed, now));

        borrowed.due_date = Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();
        assert!(!is_almost_due(&borrowed, now));
    }

    #[test]
    fn test_returned_borrow_is_never_overdue() {
        let now = Utc::now();
        let (borrowed, book) =
            borrow_book(&book(), UserId::new(), now - Duration::days(30), 7, false, None)
                .unwrap();
        let (returned, _) = return_book(&borrowed, &book, now).unwrap();

        assert!(!is_overdue(&returned, now));
        assert!(!is_almost_due(&returned, now));
    }

    #[test]
    fn test_mark_overdue_only_once() {
        let now = Utc::now();
        let (borrowed, _) =
            borrow_book(&book(), UserId::new(), now - Duration::days(30), 7, false, None)
                .unwrap();

        let overdue = mark_overdue(&borrowed, now).unwrap();
        assert_eq!(overdue.status, BorrowStatus::Overdue);
        assert!(mark_overdue(&overdue, now).is_none());
    }

    #[test]
    fn test_borrow_status_round_trips_through_str() {
        for status in [
            BorrowStatus::Borrowed,
            BorrowStatus::Overdue,
            BorrowStatus::Returned,
        ] {
            assert_eq!(status.as_str().parse::<BorrowStatus>().unwrap(), status);
        }
        assert!("lost".parse::<BorrowStatus>().is_err());
    }
}
