//! DeployEnv port - 稼働中 Deployment の環境変数

use async_trait::async_trait;

use super::OrchestratorError;
use crate::domain::EnvVar;

/// DeployEnv は稼働中 Deployment の環境変数を編集
///
/// Deployment が無い場合はどちらも `NotFound` を返す。
#[async_trait]
pub trait DeployEnv: Send + Sync {
    /// キーで upsert
    async fn create_or_update_env(
        &self,
        namespace: &str,
        deployment: &str,
        vars: &[EnvVar],
    ) -> Result<(), OrchestratorError>;

    /// 指定キーを削除
    async fn delete_env(
        &self,
        namespace: &str,
        deployment: &str,
        keys: &[String],
    ) -> Result<(), OrchestratorError>;
}
