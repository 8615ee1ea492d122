use crate::ports::*;
use std::sync::Arc;

/// サービスの依存関係
///
/// すべての協調オブジェクトを明示的に渡すためのデータ構造。
/// 振る舞い（メソッド）は持たず、各ユースケース関数に引数として渡す。
/// グローバルな状態は持たない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_repository: Arc<dyn BookRepository>,
    pub borrow_repository: Arc<dyn BorrowRepository>,
    pub reservation_repository: Arc<dyn ReservationRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub notification_channel: Arc<dyn NotificationChannel>,
}
