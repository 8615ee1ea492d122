/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowBookError {
    /// 書籍が貸出中、または他の利用者のために確保されている
    NotAvailable,
    /// 貸出日数が1日未満
    InvalidPeriod,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// 既に返却済み
    AlreadyReturned,
}

/// 予約のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveBookError {
    /// 書籍は貸出可能なので予約ではなく貸出を行う
    BookAvailable,
    /// 同じ書籍に有効な予約を既に持っている
    AlreadyReserved,
    /// 同じ書籍を既に借りている
    AlreadyBorrowing,
}

/// 予約取消のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReservationError {
    /// 既に取消済み
    AlreadyCanceled,
}

/// 通知送信済みマークのエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkSentError {
    /// 既に送信済み
    AlreadySent,
}
