//! CredentialStore port - 新しいアプリに複製する共有の認証情報

use std::collections::BTreeMap;

/// CredentialStore は secret の名前と中身を提供
pub trait CredentialStore: Send + Sync {
    /// 各アプリの namespace に作る secret の名前
    fn secret_name(&self) -> String;

    /// secret の中身（エントリ名 → バイト列）
    fn access_data(&self) -> BTreeMap<String, Vec<u8>>;
}
