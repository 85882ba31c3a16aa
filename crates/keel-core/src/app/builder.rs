//! AppBuilder - ポートを束ねて [`AppOperations`] を組み立てる
//!
//! # 学習ポイント
//! - Builder パターンによるワイヤリング
//! - 起動時検証（足りないポートは build() で即エラー）
//! - 1 つのアダプタを複数の trait object として共有（`Arc<O>` → `Arc<dyn Port>`）

use std::sync::Arc;

use super::env::EnvManager;
use super::info::InfoReader;
use super::lifecycle::Provisioner;
use super::logs::LogAggregator;
use super::metadata_store::MetadataStore;
use super::operations::AppOperations;
use super::permission::PermissionGuard;
use crate::config::Config;
use crate::impls::StaticCredentialStore;
use crate::ports::{
    Clock, CredentialStore, DeployEnv, NamespaceAdmin, NamespaceMetadata, PodLogs, SystemClock,
    TeamDirectory, WorkloadStatus,
};

/// 集約ログチャネルのデフォルト容量（行数）
pub const DEFAULT_LOG_BUFFER: usize = 256;

/// BuildError はワイヤリングが不完全なときのエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing port: {0}")]
    MissingPort(&'static str),

    #[error("log buffer must hold at least one line")]
    EmptyLogBuffer,
}

/// AppBuilder は [`AppOperations`] を構築
///
/// # 使用例
/// ```ignore
/// let orch = Arc::new(InMemoryOrchestrator::new());
/// let ops = AppBuilder::new()
///     .orchestrator(orch)
///     .team_directory(directory)
///     .credentials(credentials)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - Clock 以外のポートはすべて必須
/// - build() は最初に見つかった未設定ポートの名前を返す
/// - Clock は省略時 SystemClock
pub struct AppBuilder {
    namespace_admin: Option<Arc<dyn NamespaceAdmin>>,
    metadata: Option<Arc<dyn NamespaceMetadata>>,
    pod_logs: Option<Arc<dyn PodLogs>>,
    workload: Option<Arc<dyn WorkloadStatus>>,
    deploy_env: Option<Arc<dyn DeployEnv>>,
    directory: Option<Arc<dyn TeamDirectory>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    clock: Arc<dyn Clock>,
    log_buffer: usize,
}

impl AppBuilder {
    /// 新しい AppBuilder を作成
    pub fn new() -> Self {
        Self {
            namespace_admin: None,
            metadata: None,
            pod_logs: None,
            workload: None,
            deploy_env: None,
            directory: None,
            credentials: None,
            clock: Arc::new(SystemClock),
            log_buffer: DEFAULT_LOG_BUFFER,
        }
    }

    /// 設定ファイルからログバッファ容量と認証情報ストアを反映
    ///
    /// # Example
    /// ```ignore
    /// let config = Config::load("keel.toml")?;
    /// builder.configure(&config);
    /// ```
    pub fn configure(mut self, config: &Config) -> Self {
        self.log_buffer = config.logs.buffer_lines;
        self.credentials = Some(Arc::new(StaticCredentialStore::from_config(
            &config.credentials,
        )));
        self
    }

    /// オーケストレータ側の 5 つのポートを 1 つのアダプタでまとめて設定
    ///
    /// NamespaceAdmin / NamespaceMetadata / PodLogs / WorkloadStatus / DeployEnv
    pub fn orchestrator<O>(self, orch: Arc<O>) -> Self
    where
        O: NamespaceAdmin + NamespaceMetadata + PodLogs + WorkloadStatus + DeployEnv + 'static,
    {
        self.namespace_admin(orch.clone())
            .metadata(orch.clone())
            .pod_logs(orch.clone())
            .workload_status(orch.clone())
            .deploy_env(orch)
    }

    /// NamespaceAdmin を設定（作成系: namespace, quota, secret, autoscale）
    pub fn namespace_admin(mut self, port: Arc<dyn NamespaceAdmin>) -> Self {
        self.namespace_admin = Some(port);
        self
    }

    /// NamespaceMetadata を設定（ラベル・アノテーションの読み書き）
    pub fn metadata(mut self, port: Arc<dyn NamespaceMetadata>) -> Self {
        self.metadata = Some(port);
        self
    }

    /// PodLogs を設定
    pub fn pod_logs(mut self, port: Arc<dyn PodLogs>) -> Self {
        self.pod_logs = Some(port);
        self
    }

    /// WorkloadStatus を設定（info 用の読み取り）
    pub fn workload_status(mut self, port: Arc<dyn WorkloadStatus>) -> Self {
        self.workload = Some(port);
        self
    }

    /// DeployEnv を設定
    pub fn deploy_env(mut self, port: Arc<dyn DeployEnv>) -> Self {
        self.deploy_env = Some(port);
        self
    }

    /// TeamDirectory を設定
    pub fn team_directory(mut self, port: Arc<dyn TeamDirectory>) -> Self {
        self.directory = Some(port);
        self
    }

    /// CredentialStore を設定（アプリ作成時に複製する認証情報）
    pub fn credentials(mut self, port: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(port);
        self
    }

    /// Clock を差し替え（テストでは FixedClock）
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 集約ログチャネルの容量を設定（0 は build() でエラー）
    pub fn log_buffer(mut self, lines: usize) -> Self {
        self.log_buffer = lines;
        self
    }

    /// AppOperations を構築
    ///
    /// # 検証
    /// - 必須ポートがすべて設定されているか
    /// - log_buffer が 1 以上か
    pub fn build(self) -> Result<AppOperations, BuildError> {
        let admin = self
            .namespace_admin
            .ok_or(BuildError::MissingPort("namespace_admin"))?;
        let metadata = self.metadata.ok_or(BuildError::MissingPort("metadata"))?;
        let pod_logs = self.pod_logs.ok_or(BuildError::MissingPort("pod_logs"))?;
        let workload = self
            .workload
            .ok_or(BuildError::MissingPort("workload_status"))?;
        let deploy_env = self.deploy_env.ok_or(BuildError::MissingPort("deploy_env"))?;
        let directory = self
            .directory
            .ok_or(BuildError::MissingPort("team_directory"))?;
        let credentials = self
            .credentials
            .ok_or(BuildError::MissingPort("credentials"))?;
        if self.log_buffer == 0 {
            return Err(BuildError::EmptyLogBuffer);
        }

        let store = MetadataStore::new(metadata, self.clock);
        let guard = PermissionGuard::new(directory, store.clone());

        Ok(AppOperations {
            provisioner: Provisioner::new(guard.clone(), admin, credentials),
            logs: LogAggregator::new(guard.clone(), pod_logs, self.log_buffer),
            env: EnvManager::new(guard.clone(), store.clone(), deploy_env),
            info: InfoReader::new(guard.clone(), store.clone(), workload),
            guard,
            store,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
