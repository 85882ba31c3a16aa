//! TeamDirectory port - チーム / ユーザーディレクトリへの問い合わせ

use async_trait::async_trait;

use super::DirectoryError;
use crate::domain::Team;

#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// `email` が所属するチーム一覧
    async fn teams_of(&self, email: &str) -> Result<Vec<Team>, DirectoryError>;
}
