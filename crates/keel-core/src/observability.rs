//! tracing サブスクライバの初期化
//!
//! `[logging]` テーブルの内容から、グローバルなサブスクライバを一度だけ設定する。
//! 既にサブスクライバが設定済みの場合はそれを残す。

use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// ログの出力形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 人が読むためのテキスト形式
    #[default]
    Pretty,
    /// 1 行 1 JSON オブジェクト
    Json,
}

/// ログ設定（`[logging]` テーブル）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `RUST_LOG` が無いときに使うフィルタ（例: `"info"`, `"keel_core=debug"`）
    pub level: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    /// グローバルなサブスクライバを設定する
    ///
    /// `RUST_LOG` が設定されていれば `level` より優先する。
    /// 新しく設定できた場合は `true`、既存のサブスクライバを残した場合は `false` を返す。
    ///
    /// # 使用例
    ///
    /// ```
    /// use keel_core::observability::LoggingConfig;
    ///
    /// let config = LoggingConfig::default();
    /// config.init();
    /// // 2 回目は既存のサブスクライバがそのまま使われる
    /// assert!(!config.init());
    /// ```
    pub fn init(&self) -> bool {
        let filter = self.filter();
        let installed = match self.format {
            LogFormat::Json => fmt().json().with_env_filter(filter).try_init(),
            LogFormat::Pretty => fmt().with_env_filter(filter).try_init(),
        };

        match installed {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "subscriber already installed, keeping it");
                false
            }
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}
