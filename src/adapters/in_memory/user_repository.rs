use crate::domain::{ApplicationUser, UserId};
use crate::ports::user_repository::{Result, UserRepository as UserRepositoryTrait};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::lock;

/// In-memory implementation of UserRepository
///
/// Emails are unique, as in the database schema.
#[derive(Default)]
pub struct UserRepository {
    users: Mutex<HashMap<UserId, ApplicationUser>>,
}

impl UserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn insert(&self, user: &ApplicationUser) -> Result<()> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(format!("email {} already registered", user.email).into());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &ApplicationUser) -> Result<()> {
        lock(&self.users)?.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<ApplicationUser>> {
        Ok(lock(&self.users)?.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationUser>> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<ApplicationUser>> {
        let mut users: Vec<ApplicationUser> = lock(&self.users)?.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        Ok(lock(&self.users)?.remove(&user_id).is_some())
    }
}
