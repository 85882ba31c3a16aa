//! StaticCredentialStore - 起動時に固定される認証情報

use std::collections::BTreeMap;

use crate::config::CredentialsConfig;
use crate::ports::CredentialStore;

/// StaticCredentialStore は設定ファイルの値をそのまま返す
#[derive(Debug, Clone)]
pub struct StaticCredentialStore {
    secret_name: String,
    data: BTreeMap<String, Vec<u8>>,
}

impl StaticCredentialStore {
    /// 新しい StaticCredentialStore を作成
    pub fn new(secret_name: impl Into<String>, data: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            secret_name: secret_name.into(),
            data,
        }
    }

    /// `[credentials]` から作成（値は UTF-8 のバイト列として保持）
    pub fn from_config(config: &CredentialsConfig) -> Self {
        let data = config
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.as_bytes().to_vec()))
            .collect();
        Self::new(config.secret_name.clone(), data)
    }
}

impl CredentialStore for StaticCredentialStore {
    fn secret_name(&self) -> String {
        self.secret_name.clone()
    }

    fn access_data(&self) -> BTreeMap<String, Vec<u8>> {
        self.data.clone()
    }
}
