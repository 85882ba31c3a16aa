//! Ports - 外部コンポーネントへの狭いインターフェース
//!
//! # 学習ポイント
//! - オーケストレータは関心ごとに分割し、各コンポーネントは使う分だけに依存する
//!   - 作成系（`NamespaceAdmin`）
//!   - namespace のラベル / アノテーション（`NamespaceMetadata`）
//!   - レプリカとログ（`PodLogs`）
//!   - 稼働状態（`WorkloadStatus`）
//!   - Deployment の環境変数（`DeployEnv`）
//! - ほかにチームディレクトリ、認証情報ストア、Clock

pub mod clock;
pub mod credential_store;
pub mod deploy_env;
pub mod error;
pub mod namespace_admin;
pub mod namespace_metadata;
pub mod pod_logs;
pub mod team_directory;
pub mod workload_status;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::credential_store::CredentialStore;
pub use self::deploy_env::DeployEnv;
pub use self::error::{DirectoryError, OrchestratorError};
pub use self::namespace_admin::NamespaceAdmin;
pub use self::namespace_metadata::{
    APP_ANNOTATION, LAST_MODIFIED_ANNOTATION, LAST_USER_ANNOTATION, NamespaceMetadata, TEAM_LABEL,
};
pub use self::pod_logs::{LogOptions, LogSource, PodLogs};
pub use self::team_directory::TeamDirectory;
pub use self::workload_status::WorkloadStatus;
