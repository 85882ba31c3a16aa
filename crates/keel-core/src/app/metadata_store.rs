//! MetadataStore - namespace 上のアプリレコードとチームラベル
//!
//! # 学習ポイント
//! - 永続化の実体はアノテーション（JSON 文字列）
//! - 保存時に監査用アノテーション（最終更新者・更新時刻）も同時に書く

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{App, KeelError};
use crate::ports::{
    APP_ANNOTATION, Clock, LAST_MODIFIED_ANNOTATION, LAST_USER_ANNOTATION, NamespaceMetadata,
    TEAM_LABEL,
};

/// MetadataStore はアプリレコードを読み書きする
///
/// 設定の正はこのレコード。稼働中のワークロードはレコードから導出される。
#[derive(Clone)]
pub struct MetadataStore {
    metadata: Arc<dyn NamespaceMetadata>,
    clock: Arc<dyn Clock>,
}

impl MetadataStore {
    /// 新しい MetadataStore を作成
    pub fn new(metadata: Arc<dyn NamespaceMetadata>, clock: Arc<dyn Clock>) -> Self {
        Self { metadata, clock }
    }

    /// namespace のラベルから所有チームを取得（レコードはデコードしない）
    pub async fn team_of(&self, app_name: &str) -> Result<String, KeelError> {
        self.metadata
            .label(app_name, TEAM_LABEL)
            .await
            .map_err(KeelError::from)
    }

    /// アプリレコードを取得
    ///
    /// # エラー
    /// - アノテーションが無い: NotFound
    /// - JSON が壊れている: Internal
    pub async fn get(&self, app_name: &str) -> Result<App, KeelError> {
        let raw = self
            .metadata
            .annotation(app_name, APP_ANNOTATION)
            .await
            .map_err(KeelError::from)?;

        serde_json::from_str(&raw)
            .map_err(|e| KeelError::internal(format!("decode app '{app_name}' failed: {e}")))
    }

    /// レコードと監査用アノテーションを 1 回の書き込みで保存
    ///
    /// - `keel.io/app`: レコード（JSON）
    /// - `keel.io/last-user`: 操作したユーザーのメールアドレス
    /// - `keel.io/last-modified`: Clock の現在時刻（RFC 3339）
    pub async fn save(&self, app: &App, acting_user_email: &str) -> Result<(), KeelError> {
        let encoded = serde_json::to_string(app)
            .map_err(|e| KeelError::internal(format!("encode app '{}' failed: {e}", app.name)))?;

        let annotations = BTreeMap::from([
            (APP_ANNOTATION.to_string(), encoded),
            (LAST_USER_ANNOTATION.to_string(), acting_user_email.to_string()),
            (
                LAST_MODIFIED_ANNOTATION.to_string(),
                self.clock.now().to_rfc3339(),
            ),
        ]);

        self.metadata
            .set_annotations(&app.name, annotations)
            .await
            .map_err(KeelError::internal)
    }
}
