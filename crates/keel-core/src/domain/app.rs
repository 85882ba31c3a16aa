//! App - デプロイされたアプリの永続化レコード
//!
//! # 学習ポイント
//! - serde でアノテーション用の JSON に変換
//! - `#[serde(default)]` で古いレコードにも対応
//! - 環境変数はキーで upsert（順序は最初に設定された順）

use serde::{Deserialize, Serialize};

/// 環境変数 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    /// 新しい EnvVar を作成
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// LimitRange 内のリソース量 1 件（例: `("cpu", "200m")`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitQuantity {
    pub resource: String,
    pub quantity: String,
}

impl LimitQuantity {
    pub fn new(resource: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            quantity: quantity.into(),
        }
    }
}

/// namespace の quota で適用するコンテナのリソース制限
///
/// デフォルト: 上限 cpu 200m / memory 512Mi、要求 cpu 100m / memory 256Mi
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub default: Vec<LimitQuantity>,
    #[serde(default)]
    pub default_request: Vec<LimitQuantity>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default: vec![
                LimitQuantity::new("cpu", "200m"),
                LimitQuantity::new("memory", "512Mi"),
            ],
            default_request: vec![
                LimitQuantity::new("cpu", "100m"),
                LimitQuantity::new("memory", "256Mi"),
            ],
        }
    }
}

/// 水平オートスケールの設定（デフォルト: CPU 70%, min 1, max 1）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScale {
    pub cpu_target_utilization: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for AutoScale {
    fn default() -> Self {
        Self {
            cpu_target_utilization: 70,
            min: 1,
            max: 1,
        }
    }
}

/// App はアプリの namespace に保存される正のレコード
///
/// `name` は namespace 名と Deployment 名を兼ねる。
/// `env_vars` のキーは一意。
///
/// # 使用例
/// ```
/// use keel_core::domain::App;
///
/// let app = App::new("api", "core").with_env_var("RUST_LOG", "info");
/// assert_eq!(app.env_var("RUST_LOG"), Some("info"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub autoscale: AutoScale,
}

impl App {
    /// デフォルトの limits / autoscale で新しい App を作成
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            env_vars: Vec::new(),
            limits: Limits::default(),
            autoscale: AutoScale::default(),
        }
    }

    /// 環境変数を 1 つ追加した App を返す（builder 風）
    pub fn with_env_var(mut self, key: &str, value: &str) -> Self {
        self.set_env_vars(&[EnvVar::new(key, value)]);
        self
    }

    /// キーで upsert（既存キーは位置を保ち、新しいキーは末尾に追加）
    pub fn set_env_vars(&mut self, evs: &[EnvVar]) {
        for ev in evs {
            match self.env_vars.iter_mut().find(|cur| cur.key == ev.key) {
                Some(cur) => cur.value = ev.value.clone(),
                None => self.env_vars.push(ev.clone()),
            }
        }
    }

    /// 指定したキーをすべて削除（存在しないキーは無視）
    pub fn unset_env_vars(&mut self, keys: &[String]) {
        self.env_vars.retain(|ev| !keys.contains(&ev.key));
    }

    /// キーに対応する値
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env_vars
            .iter()
            .find(|ev| ev.key == key)
            .map(|ev| ev.value.as_str())
    }
}
