//! Info - 表示用にその場で組み立てる読み取りモデル（永続化しない）

use serde::{Deserialize, Serialize};

use super::app::{AutoScale, EnvVar, Limits};

/// ワークロードのレプリカ 1 つ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub state: String,
}

impl Pod {
    /// 状態 `Running` の Pod を作成
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: "Running".to_string(),
        }
    }
}

/// 外部から到達できるアドレス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub hostname: String,
}

/// 稼働中の状態
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// 現在の CPU 使用率（%）。オートスケーラが報告しない場合は None
    pub cpu: Option<u32>,
    pub pods: Vec<Pod>,
}

/// Info はアプリの現在の様子をまとめたもの
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub team: String,
    pub addresses: Vec<Address>,
    pub status: Status,
    pub autoscale: AutoScale,
    pub limits: Limits,
    pub env_vars: Vec<EnvVar>,
}
