//! Provisioner - 新しいアプリのオブジェクトをオーケストレータに作成
//!
//! # 処理の流れ
//! 1. `app.team` への権限チェック（通るまで外部呼び出しはしない）
//! 2. namespace（チームラベルと初期レコードを持つ）
//! 3. resource quota
//! 4. CredentialStore から複製したアクセス用 secret
//! 5. autoscale ポリシー
//!
//! 途中で失敗したらそこで止める。作成済みのオブジェクトは残し、
//! `warn` イベントで運用者に知らせる。

use std::sync::Arc;

use tracing::{info, warn};

use super::permission::PermissionGuard;
use crate::domain::{App, KeelError, User};
use crate::ports::{CredentialStore, NamespaceAdmin, OrchestratorError};

/// Provisioner はアプリ作成を担当
#[derive(Clone)]
pub struct Provisioner {
    guard: PermissionGuard,
    admin: Arc<dyn NamespaceAdmin>,
    credentials: Arc<dyn CredentialStore>,
}

impl Provisioner {
    /// 新しい Provisioner を作成
    pub fn new(
        guard: PermissionGuard,
        admin: Arc<dyn NamespaceAdmin>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            guard,
            admin,
            credentials,
        }
    }

    /// アプリを作成
    ///
    /// # エラー
    /// - チームのメンバーでない: PermissionDenied
    /// - namespace が既にある: AlreadyExists
    /// - それ以外の失敗: Internal
    pub async fn create(&self, user: &User, app: &App) -> Result<(), KeelError> {
        if !self.guard.has_team_permission(user, &app.team).await {
            return Err(KeelError::permission_denied());
        }

        self.admin
            .create_namespace(app, &user.email)
            .await
            .map_err(|e| {
                if e.is_already_exists() {
                    KeelError::already_exists(format!("app '{}'", app.name))
                } else {
                    KeelError::internal(e)
                }
            })?;

        self.admin
            .create_quota(app)
            .await
            .map_err(|e| partial(app, "quota", e))?;

        let secret_name = self.credentials.secret_name();
        self.admin
            .create_secret(&app.name, &secret_name, self.credentials.access_data())
            .await
            .map_err(|e| partial(app, "secret", e))?;

        self.admin
            .create_autoscale(app)
            .await
            .map_err(|e| partial(app, "autoscale", e))?;

        info!(app = %app.name, team = %app.team, user = %user.email, "app provisioned");
        Ok(())
    }
}

fn partial(app: &App, step: &'static str, err: OrchestratorError) -> KeelError {
    warn!(
        app = %app.name,
        step,
        error = %err,
        "provisioning stopped, namespace left partially provisioned"
    );
    KeelError::internal(err)
}
