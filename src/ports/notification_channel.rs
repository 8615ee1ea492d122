use crate::domain::Notification;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知チャネルポート
///
/// 利用者への通知配信メカニズムを抽象化する。
/// 実装はメール、SMS、プッシュ通知などが考えられる。
/// ワークフローはこのポートにのみ依存し、配信手段を知らない。
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 通知を配信する
    ///
    /// 成功した場合のみ通知は送信済みになる。
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}
