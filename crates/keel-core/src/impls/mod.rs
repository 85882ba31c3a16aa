//! Impls - 開発・デモ・テスト用のインメモリ実装
//!
//! 本番用のアダプタ（オーケストレータ API クライアント、実際のチームディレクトリ）は
//! このクレートの外で同じポートを実装する。

pub mod inmem_directory;
pub mod inmem_orchestrator;
pub mod static_credentials;

pub use self::inmem_directory::InMemoryTeamDirectory;
pub use self::inmem_orchestrator::{InMemoryOrchestrator, Op};
pub use self::static_credentials::StaticCredentialStore;
