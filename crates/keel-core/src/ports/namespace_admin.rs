//! NamespaceAdmin port - アプリ作成のための基本操作

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::OrchestratorError;
use crate::domain::App;

/// NamespaceAdmin はアプリを構成するオブジェクトを作成
///
/// 各呼び出しは独立しており、まとめてのトランザクションは無い。
#[async_trait]
pub trait NamespaceAdmin: Send + Sync {
    /// namespace `app.name` を作成
    ///
    /// チームラベル、初期レコード、作成ユーザーを付ける。既にあれば `AlreadyExists`。
    async fn create_namespace(&self, app: &App, user_email: &str) -> Result<(), OrchestratorError>;

    /// ResourceQuota と LimitRange を作成
    async fn create_quota(&self, app: &App) -> Result<(), OrchestratorError>;

    /// secret を作成
    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), OrchestratorError>;

    /// オートスケーラを作成
    async fn create_autoscale(&self, app: &App) -> Result<(), OrchestratorError>;
}
