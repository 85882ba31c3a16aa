//! PermissionGuard - 全操作の入口にある権限チェック
//!
//! # 学習ポイント
//! - 権限 = 所有チームのメンバーであること
//! - キャッシュしない（毎回ディレクトリに問い合わせる）
//! - 問い合わせ失敗は拒否として扱う

use std::sync::Arc;

use tracing::warn;

use super::metadata_store::MetadataStore;
use crate::domain::{KeelError, User};
use crate::ports::TeamDirectory;

/// PermissionGuard は「このユーザーはこのアプリ / チームを操作できるか」に答える
#[derive(Clone)]
pub struct PermissionGuard {
    directory: Arc<dyn TeamDirectory>,
    store: MetadataStore,
}

impl PermissionGuard {
    /// 新しい PermissionGuard を作成
    pub fn new(directory: Arc<dyn TeamDirectory>, store: MetadataStore) -> Self {
        Self { directory, store }
    }

    /// user が team のメンバーか
    pub async fn has_team_permission(&self, user: &User, team: &str) -> bool {
        match self.directory.teams_of(&user.email).await {
            Ok(teams) => teams.iter().any(|t| t.name == team),
            Err(e) => {
                warn!(user = %user.email, team, error = %e, "team lookup failed, denying");
                false
            }
        }
    }

    /// user がアプリ所有チームのメンバーか（解決に失敗したら false）
    pub async fn has_permission(&self, user: &User, app_name: &str) -> bool {
        match self.store.team_of(app_name).await {
            Ok(team) => self.has_team_permission(user, &team).await,
            Err(_) => false,
        }
    }

    /// 所有チームを解決してメンバーシップを確認し、チーム名を返す
    ///
    /// [`has_permission`](Self::has_permission) と違い、解決の失敗
    /// （NotFound / Internal）と拒否（PermissionDenied）を区別する。
    pub async fn authorize(&self, user: &User, app_name: &str) -> Result<String, KeelError> {
        let team = self.store.team_of(app_name).await?;
        if !self.has_team_permission(user, &team).await {
            return Err(KeelError::permission_denied());
        }
        Ok(team)
    }
}
