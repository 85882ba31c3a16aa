//! keel-core
//!
//! コンテナオーケストレータ上のアプリを管理するコントロールプレーンのコア:
//! チームメンバーシップによる権限、namespace に保存するアプリレコード、
//! アプリ作成、複数レプリカのログ集約、環境変数の管理。
//!
//! # モジュール構成
//! - **domain**: App, EnvVar, User / Team, Info, エラー分類
//! - **ports**: オーケストレータ・チームディレクトリ・認証情報ストアへの trait
//! - **app**: 各コンポーネントと `Operations` ファサード
//! - **impls**: インメモリ実装
//! - **config** / **observability**: TOML 設定と tracing の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{AppBuilder, AppOperations, LogStream, Operations};
pub use config::Config;
pub use domain::{App, EnvVar, ErrorKind, KeelError, User};
