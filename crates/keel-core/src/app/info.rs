//! InfoReader - `Info` を組み立てる

use std::sync::Arc;

use super::metadata_store::MetadataStore;
use super::permission::PermissionGuard;
use crate::domain::{Info, KeelError, User};
use crate::ports::WorkloadStatus;

/// quota と一緒に作られる LimitRange の名前
pub const LIMITS_NAME: &str = "limits";

/// InfoReader はアプリの状態をまとめて読む
///
/// レコード由来: team, env_vars
/// ワークロード由来: addresses, status, autoscale, limits
#[derive(Clone)]
pub struct InfoReader {
    guard: PermissionGuard,
    store: MetadataStore,
    workload: Arc<dyn WorkloadStatus>,
}

impl InfoReader {
    /// 新しい InfoReader を作成
    pub fn new(
        guard: PermissionGuard,
        store: MetadataStore,
        workload: Arc<dyn WorkloadStatus>,
    ) -> Self {
        Self {
            guard,
            store,
            workload,
        }
    }

    /// 権限を確認してから Info を返す（ワークロード側の失敗は Internal）
    pub async fn info(&self, user: &User, app_name: &str) -> Result<Info, KeelError> {
        let team = self.guard.authorize(user, app_name).await?;
        let app = self.store.get(app_name).await?;

        let addresses = self
            .workload
            .addresses(app_name)
            .await
            .map_err(KeelError::internal)?;
        let status = self
            .workload
            .status(app_name)
            .await
            .map_err(KeelError::internal)?;
        let autoscale = self
            .workload
            .autoscale(app_name)
            .await
            .map_err(KeelError::internal)?;
        let limits = self
            .workload
            .limits(app_name, LIMITS_NAME)
            .await
            .map_err(KeelError::internal)?;

        Ok(Info {
            team,
            addresses,
            status,
            autoscale,
            limits,
            env_vars: app.env_vars,
        })
    }
}
