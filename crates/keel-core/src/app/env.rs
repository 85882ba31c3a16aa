//! EnvManager - レコードと稼働中 Deployment の環境変数を更新
//!
//! # 処理の流れ（set / unset 共通）
//! 1. 保護キーが 1 つでもあればバッチ全体を拒否（読み取りより前）
//! 2. チームと権限を確認し、レコードを読む
//! 3. メモリ上で適用
//! 4. レコードを保存（操作したユーザーも記録）
//! 5. Deployment に反映（Deployment が無ければ何もしない）
//!
//! 5 が失敗するとレコードだけが新しい値を持つ。この状態は Internal として
//! 返してログに残し、ロールバックはしない。

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::metadata_store::MetadataStore;
use super::permission::PermissionGuard;
use crate::domain::{App, EnvVar, KeelError, User, check_protected};
use crate::ports::{DeployEnv, OrchestratorError};

/// EnvManager は環境変数の変更を担当
#[derive(Clone)]
pub struct EnvManager {
    guard: PermissionGuard,
    store: MetadataStore,
    deploy: Arc<dyn DeployEnv>,
}

impl EnvManager {
    /// 新しい EnvManager を作成
    pub fn new(guard: PermissionGuard, store: MetadataStore, deploy: Arc<dyn DeployEnv>) -> Self {
        Self {
            guard,
            store,
            deploy,
        }
    }

    /// 環境変数を追加・更新（既存キーは上書き）
    ///
    /// # Example
    /// ```ignore
    /// env.set_env(&user, "api", &[EnvVar::new("DATABASE_URL", "postgres://...")]).await?;
    /// ```
    pub async fn set_env(&self, user: &User, app_name: &str, evs: &[EnvVar]) -> Result<(), KeelError> {
        check_protected(evs.iter().map(|ev| ev.key.as_str()))?;

        let mut app = self.load_authorized(user, app_name).await?;
        app.set_env_vars(evs);
        self.store.save(&app, &user.email).await?;

        let live = self
            .deploy
            .create_or_update_env(app_name, app_name, evs)
            .await;
        self.settle(app_name, "set", live)?;

        info!(app = app_name, user = %user.email, count = evs.len(), "env vars set");
        Ok(())
    }

    /// 環境変数を削除（存在しないキーは無視）
    pub async fn unset_env(
        &self,
        user: &User,
        app_name: &str,
        keys: &[String],
    ) -> Result<(), KeelError> {
        check_protected(keys.iter().map(String::as_str))?;

        let mut app = self.load_authorized(user, app_name).await?;
        app.unset_env_vars(keys);
        self.store.save(&app, &user.email).await?;

        let live = self.deploy.delete_env(app_name, app_name, keys).await;
        self.settle(app_name, "unset", live)?;

        info!(app = app_name, user = %user.email, count = keys.len(), "env vars unset");
        Ok(())
    }

    async fn load_authorized(&self, user: &User, app_name: &str) -> Result<App, KeelError> {
        self.guard.authorize(user, app_name).await?;
        self.store.get(app_name).await
    }

    /// Deployment への反映結果をまとめる
    fn settle(
        &self,
        app_name: &str,
        action: &'static str,
        live: Result<(), OrchestratorError>,
    ) -> Result<(), KeelError> {
        match live {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(app = app_name, "no live deployment, record updated only");
                Ok(())
            }
            Err(e) => {
                warn!(
                    app = app_name,
                    action,
                    error = %e,
                    "record updated but deployment env not, needs reconciliation"
                );
                Err(KeelError::internal(e))
            }
        }
    }
}
