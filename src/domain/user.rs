use chrono::{DateTime, Utc};

use super::UserId;

/// ロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "User" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// 利用者アカウント
///
/// `password_hash`を含むためシリアライズしない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationUser {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl ApplicationUser {
    /// 新規アカウント（ユーザー名はメールアドレス）
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        let email = email.into();
        Self {
            id: UserId::new(),
            user_name: email.clone(),
            email,
            name: name.into(),
            password_hash: password_hash.into(),
            roles: vec![role],
            created_at,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_uses_email_as_user_name() {
        let user = ApplicationUser::new("a@example.com", "Alice", "hash", Role::User, Utc::now());
        assert_eq!(user.user_name, "a@example.com");
        assert!(user.has_role(Role::User));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }
}
