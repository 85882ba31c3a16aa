use serde::{Deserialize, Serialize};

/// 外部ディレクトリから渡されるユーザー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// 管理者でない User を作成
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            is_admin: false,
        }
    }
}

/// Team はアプリを所有し、メンバーを持つ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Team {
    /// メンバーのいない Team を作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: String::new(),
            url: String::new(),
            users: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.email == email)
    }
}
