use crate::domain::{ApplicationUser, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者リポジトリポート
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 新しい利用者を保存する（メールアドレスは一意）
    async fn insert(&self, user: &ApplicationUser) -> Result<()>;

    /// 利用者情報を保存する
    async fn save(&self, user: &ApplicationUser) -> Result<()>;

    /// IDで利用者を取得する
    async fn get_by_id(&self, user_id: UserId) -> Result<Option<ApplicationUser>>;

    /// メールアドレスで利用者を取得する
    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationUser>>;

    /// すべての利用者（登録日時の昇順）
    async fn find_all(&self) -> Result<Vec<ApplicationUser>>;

    /// 利用者を削除する
    async fn delete(&self, user_id: UserId) -> Result<bool>;
}
