//! PodLogs port - レプリカの一覧とレプリカごとのログ

use async_trait::async_trait;
use tokio::io::AsyncBufRead;

use super::OrchestratorError;
use crate::domain::Pod;

/// レプリカの生のログ出力（改行区切りのバイト列。UTF-8 とは限らない）
pub type LogSource = Box<dyn AsyncBufRead + Send + Unpin>;

/// どこからどこまで読むか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// 末尾から何行前から読むか
    pub lines: u64,
    /// 開いたままにして新しい行も流す
    pub follow: bool,
}

/// PodLogs はレプリカのログを開く
#[async_trait]
pub trait PodLogs: Send + Sync {
    /// `namespace` で稼働中のレプリカ一覧
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, OrchestratorError>;

    /// レプリカ 1 つのログを開く
    async fn logs(
        &self,
        namespace: &str,
        pod: &str,
        opts: LogOptions,
    ) -> Result<LogSource, OrchestratorError>;
}
