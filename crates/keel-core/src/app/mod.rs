//! App - アプリケーション層
//!
//! ポートの上に載るコンポーネント（依存の少ない順）:
//! - **MetadataStore**: namespace 上のアプリレコードとチームラベル
//! - **PermissionGuard**: チームメンバーシップによる権限チェック
//! - **Provisioner**: namespace → quota → secret → autoscale
//! - **LogAggregator**: レプリカごとのログを 1 本に集約
//! - **EnvManager**: レコードと Deployment の環境変数を更新
//! - **InfoReader**: `Info` の組み立て
//!
//! `Operations` がファサード、`AppBuilder` がワイヤリングを担当。

pub mod builder;
pub mod env;
pub mod info;
pub mod lifecycle;
pub mod logs;
pub mod metadata_store;
pub mod operations;
pub mod permission;

pub use self::builder::{AppBuilder, BuildError, DEFAULT_LOG_BUFFER};
pub use self::env::EnvManager;
pub use self::info::{InfoReader, LIMITS_NAME};
pub use self::lifecycle::Provisioner;
pub use self::logs::{LogAggregator, LogStream};
pub use self::metadata_store::MetadataStore;
pub use self::operations::{AppOperations, Operations};
pub use self::permission::PermissionGuard;
