//! Errors - ドメインエラーの分類
//!
//! # 学習ポイント
//! - ファサードの全操作は [`KeelError`] を返す
//! - 呼び出し側は [`ErrorKind`] で分岐する（メッセージ文字列では分岐しない）
//! - 原因となったエラーは `source()` で辿れる

use std::error::Error as StdError;
use std::fmt;

use crate::ports::OrchestratorError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// ErrorKind はコアが返しうる失敗の種類
///
/// - `PermissionDenied` / `ProtectedEnvVar`: 変更の前に検出する。リクエストを直せば再試行できる
/// - `Internal`: 外部呼び出しの失敗。原因は診断用に保持する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ProtectedEnvVar,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::ProtectedEnvVar => "protected env var",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// KeelError はファサードが返すドメインエラー
#[derive(Debug)]
pub struct KeelError {
    kind: ErrorKind,
    message: String,
    source: Option<BoxError>,
}

impl KeelError {
    /// 種類とメッセージから KeelError を作成
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// NotFound を作成
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, what)
    }

    /// AlreadyExists を作成
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, what)
    }

    /// PermissionDenied を作成
    pub fn permission_denied() -> Self {
        Self::new(ErrorKind::PermissionDenied, "user is not a member of the owning team")
    }

    /// ProtectedEnvVar を作成（拒否したキーをメッセージに含める）
    pub fn protected_env_var(key: &str) -> Self {
        Self::new(
            ErrorKind::ProtectedEnvVar,
            format!("env var '{key}' is reserved by the platform"),
        )
    }

    /// 下位のエラーを Internal として包む（元のエラーは source に残る）
    ///
    /// # Example
    /// ```ignore
    /// port.create_quota(app).await.map_err(KeelError::internal)?;
    /// ```
    pub fn internal<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        let cause = cause.into();
        Self {
            kind: ErrorKind::Internal,
            message: cause.to_string(),
            source: Some(cause),
        }
    }

    /// エラーの種類
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 人が読むためのメッセージ
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for KeelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for KeelError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// NotFound はそのまま、それ以外は Internal に変換
impl From<OrchestratorError> for KeelError {
    fn from(err: OrchestratorError) -> Self {
        if err.is_not_found() {
            let mut e = KeelError::not_found(err.to_string());
            e.source = Some(Box::new(err));
            return e;
        }
        KeelError::internal(err)
    }
}
