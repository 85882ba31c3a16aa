//! 外部コンポーネントが返すエラー

use thiserror::Error;

/// オーケストレータの失敗
///
/// アダプタはクライアントのステータスコードをこの 3 つに対応させる。
/// コアは背後の API を知らずに失敗を分類できる。
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("orchestrator api: {0}")]
    Api(String),
}

impl OrchestratorError {
    /// NotFound か
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestratorError::NotFound(_))
    }

    /// AlreadyExists か
    pub fn is_already_exists(&self) -> bool {
        matches!(self, OrchestratorError::AlreadyExists(_))
    }
}

/// チームディレクトリの失敗
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("team directory unavailable: {0}")]
    Unavailable(String),
}
