//! NamespaceMetadata port - namespace に付く文字列のキーバリュー

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::OrchestratorError;

/// 所有チーム名のラベル
pub const TEAM_LABEL: &str = "keel.io/team";

/// JSON にしたアプリレコードのアノテーション
pub const APP_ANNOTATION: &str = "keel.io/app";

/// 最後にレコードを変更したユーザーのメールアドレス
pub const LAST_USER_ANNOTATION: &str = "keel.io/last-user";

/// 最後に変更した時刻（RFC 3339）
pub const LAST_MODIFIED_ANNOTATION: &str = "keel.io/last-modified";

/// NamespaceMetadata はアプリ namespace のラベルとアノテーションを文字列として扱う
#[async_trait]
pub trait NamespaceMetadata: Send + Sync {
    /// ラベルを 1 つ読む（namespace かラベルが無ければ `NotFound`）
    async fn label(&self, namespace: &str, key: &str) -> Result<String, OrchestratorError>;

    /// アノテーションを 1 つ読む（namespace かアノテーションが無ければ `NotFound`）
    async fn annotation(&self, namespace: &str, key: &str) -> Result<String, OrchestratorError>;

    /// 1 回の更新ですべて書く（全部書けるか、何も書かないか）
    async fn set_annotations(
        &self,
        namespace: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<(), OrchestratorError>;
}
