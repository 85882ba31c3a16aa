//! Config - TOML から読む設定
//!
//! # 使用例
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [logs]
//! buffer_lines = 512
//! default_tail_lines = 20
//!
//! [credentials]
//! secret_name = "platform-access"
//! data = { access_key = "...", secret_key = "..." }
//! ```
//!
//! テーブルもフィールドもすべて省略可能。

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::app::DEFAULT_LOG_BUFFER;
use crate::observability::LoggingConfig;

/// ConfigError は設定の読み込み・検証エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Config は設定ファイル全体
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub logs: LogsConfig,
    pub credentials: CredentialsConfig,
}

/// ログ集約の設定（`[logs]`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// ワーカー共有チャネルの容量
    pub buffer_lines: usize,
    /// 呼び出し側が行数を指定しないときのレプリカごとの行数
    pub default_tail_lines: u64,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            buffer_lines: DEFAULT_LOG_BUFFER,
            default_tail_lines: 10,
        }
    }
}

/// 全アプリの namespace に作るアクセス用 secret（`[credentials]`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub secret_name: String,
    pub data: BTreeMap<String, String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            secret_name: "platform-access".into(),
            data: BTreeMap::new(),
        }
    }
}

impl Config {
    /// TOML 文字列から読んで検証
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルから読んで検証
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// 値の範囲チェック（buffer_lines > 0、secret_name が空でない）
    fn validate(&self) -> Result<(), ConfigError> {
        if self.logs.buffer_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "logs.buffer_lines",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.credentials.secret_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "credentials.secret_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
