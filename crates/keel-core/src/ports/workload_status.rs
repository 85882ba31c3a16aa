//! WorkloadStatus port - info 用に稼働状態を読む

use async_trait::async_trait;

use super::OrchestratorError;
use crate::domain::{Address, AutoScale, Limits, Status};

#[async_trait]
pub trait WorkloadStatus: Send + Sync {
    async fn addresses(&self, namespace: &str) -> Result<Vec<Address>, OrchestratorError>;

    async fn status(&self, namespace: &str) -> Result<Status, OrchestratorError>;

    async fn autoscale(&self, namespace: &str) -> Result<AutoScale, OrchestratorError>;

    /// namespace の LimitRange `name` を読む
    async fn limits(&self, namespace: &str, name: &str) -> Result<Limits, OrchestratorError>;
}
