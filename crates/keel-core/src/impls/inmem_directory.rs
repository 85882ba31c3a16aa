//! InMemoryTeamDirectory - 開発用のチーム / ユーザーディレクトリ

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{Team, User};
use crate::ports::{DirectoryError, TeamDirectory};

/// InMemoryTeamDirectory はメモリ上のチーム一覧
#[derive(Default)]
pub struct InMemoryTeamDirectory {
    teams: Mutex<Vec<Team>>,
    unavailable: AtomicBool,
}

impl InMemoryTeamDirectory {
    /// 空のディレクトリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// チームを追加
    pub fn add_team(&self, team: Team) {
        self.teams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(team);
    }

    /// `team` があれば `user` を追加
    pub fn add_member(&self, team: &str, user: User) {
        let mut teams = self.teams.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(t) = teams.iter_mut().find(|t| t.name == team) {
            t.users.push(user);
        }
    }

    /// 障害の再現（設定中は問い合わせがすべて失敗）
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }
}

#[async_trait]
impl TeamDirectory for InMemoryTeamDirectory {
    async fn teams_of(&self, email: &str) -> Result<Vec<Team>, DirectoryError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(DirectoryError::Unavailable("directory offline".into()));
        }
        let teams = self.teams.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(teams.iter().filter(|t| t.has_member(email)).cloned().collect())
    }
}
