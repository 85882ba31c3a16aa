//! プラットフォームが予約している環境変数キー

use super::errors::KeelError;

/// 全ワークロードにプラットフォームが注入するキー
///
/// ユーザーは設定も削除もできない。大文字小文字は区別する。
pub const PROTECTED_ENV_VARS: &[&str] = &["PORT", "APP", "SLUG_URL", "BUILDER_STORAGE"];

/// key が予約済みか
pub fn is_protected(key: &str) -> bool {
    PROTECTED_ENV_VARS.contains(&key)
}

/// 予約済みのキーが 1 つでもあればバッチ全体を拒否
///
/// # Example
/// ```
/// use keel_core::domain::{ErrorKind, check_protected};
///
/// let err = check_protected(["FOO", "PORT"]).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::ProtectedEnvVar);
/// ```
pub fn check_protected<'a, I>(keys: I) -> Result<(), KeelError>
where
    I: IntoIterator<Item = &'a str>,
{
    match keys.into_iter().find(|k| is_protected(k)) {
        Some(key) => Err(KeelError::protected_env_var(key)),
        None => Ok(()),
    }
}
