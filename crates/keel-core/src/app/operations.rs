//! Operations - 各コンポーネントをまとめるファサード
//!
//! # 学習ポイント
//! - async_trait によるトランスポート非依存のインターフェース
//! - 実装側は委譲のみ（ロジックは各コンポーネントに置く）

use async_trait::async_trait;

use super::env::EnvManager;
use super::info::InfoReader;
use super::lifecycle::Provisioner;
use super::logs::{LogAggregator, LogStream};
use super::metadata_store::MetadataStore;
use super::permission::PermissionGuard;
use crate::domain::{App, EnvVar, Info, KeelError, User};

/// Operations は RPC / REST ハンドラから呼ばれる操作の一覧
///
/// リクエストのデコード、認証、レスポンスのエンコードは呼び出し側で行う。
///
/// # 使用例
/// ```ignore
/// let ops: Arc<dyn Operations> = Arc::new(AppBuilder::new().orchestrator(orch)/* ... */.build()?);
/// ops.create(&user, &App::new("api", "core")).await?;
/// let info = ops.info(&user, "api").await?;
/// ```
#[async_trait]
pub trait Operations: Send + Sync {
    /// アプリを作成（namespace → quota → secret → autoscale）
    async fn create(&self, user: &User, app: &App) -> Result<(), KeelError>;

    /// 全レプリカのログを 1 本のストリームにまとめて返す
    async fn logs(
        &self,
        user: &User,
        app_name: &str,
        lines: u64,
        follow: bool,
    ) -> Result<LogStream, KeelError>;

    /// アドレス・状態・スケール設定・リソース制限・環境変数をまとめて取得
    async fn info(&self, user: &User, app_name: &str) -> Result<Info, KeelError>;

    /// アプリを所有するチーム名（権限チェックなし）
    async fn team_name(&self, app_name: &str) -> Result<String, KeelError>;

    /// 保存済みのアプリレコード（権限チェックなし）
    async fn get(&self, app_name: &str) -> Result<App, KeelError>;

    /// user がアプリ所有チームのメンバーか
    async fn has_permission(&self, user: &User, app_name: &str) -> bool;

    /// 環境変数を追加・更新
    async fn set_env(&self, user: &User, app_name: &str, evs: &[EnvVar]) -> Result<(), KeelError>;

    /// 環境変数を削除
    async fn unset_env(&self, user: &User, app_name: &str, keys: &[String])
    -> Result<(), KeelError>;
}

/// AppOperations は Operations の標準実装
///
/// [`AppBuilder`](super::AppBuilder) で構築する。
#[derive(Clone)]
pub struct AppOperations {
    pub(super) store: MetadataStore,
    pub(super) guard: PermissionGuard,
    pub(super) provisioner: Provisioner,
    pub(super) logs: LogAggregator,
    pub(super) env: EnvManager,
    pub(super) info: InfoReader,
}

#[async_trait]
impl Operations for AppOperations {
    async fn create(&self, user: &User, app: &App) -> Result<(), KeelError> {
        self.provisioner.create(user, app).await
    }

    async fn logs(
        &self,
        user: &User,
        app_name: &str,
        lines: u64,
        follow: bool,
    ) -> Result<LogStream, KeelError> {
        self.logs.logs(user, app_name, lines, follow).await
    }

    async fn info(&self, user: &User, app_name: &str) -> Result<Info, KeelError> {
        self.info.info(user, app_name).await
    }

    async fn team_name(&self, app_name: &str) -> Result<String, KeelError> {
        self.store.team_of(app_name).await
    }

    async fn get(&self, app_name: &str) -> Result<App, KeelError> {
        self.store.get(app_name).await
    }

    async fn has_permission(&self, user: &User, app_name: &str) -> bool {
        self.guard.has_permission(user, app_name).await
    }

    async fn set_env(&self, user: &User, app_name: &str, evs: &[EnvVar]) -> Result<(), KeelError> {
        self.env.set_env(user, app_name, evs).await
    }

    async fn unset_env(
        &self,
        user: &User,
        app_name: &str,
        keys: &[String],
    ) -> Result<(), KeelError> {
        self.env.unset_env(user, app_name, keys).await
    }
}
