//! InMemoryOrchestrator - オーケストレータ側の全ポートの開発用実装
//!
//! # 学習ポイント
//! - 1 つの構造体で 5 つの trait を実装
//! - `std::sync::Mutex` の中身は await をまたいで持たない
//! - follow 用のログは `tokio::io::duplex` のパイプで流す
//!
//! テストからは次のこともできる:
//! - レプリカとそのログを用意する（`add_pod`, `append_log_line`）
//! - 操作ごと（`fail`）やレプリカごとに失敗を注入する
//! - ポート呼び出しの履歴を見る（`calls`）

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadBuf};
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::{Address, App, AutoScale, EnvVar, Limits, Pod, Status};
use crate::ports::{
    APP_ANNOTATION, DeployEnv, LAST_USER_ANNOTATION, LogOptions, LogSource, NamespaceAdmin,
    NamespaceMetadata, OrchestratorError, PodLogs, TEAM_LABEL, WorkloadStatus,
};

/// 呼び出し履歴に記録されるポート操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateNamespace,
    CreateQuota,
    CreateSecret,
    CreateAutoScale,
    Label,
    Annotation,
    SetAnnotations,
    Pods,
    Logs,
    Addresses,
    Status,
    AutoScale,
    Limits,
    CreateOrUpdateEnv,
    DeleteEnv,
}

/// follow 用パイプ 1 本の容量
const FOLLOW_PIPE_BYTES: usize = 64 * 1024;

type Follower = Arc<AsyncMutex<DuplexStream>>;

struct ReplicaRecord {
    pod: Pod,
    history: Vec<String>,
    followers: Vec<Follower>,
    fail_open: bool,
    broken: bool,
}

#[derive(Default)]
struct NamespaceRecord {
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    quota: Option<Limits>,
    secrets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    autoscale: Option<AutoScale>,
    deployment: Option<Vec<EnvVar>>,
    replicas: Vec<ReplicaRecord>,
    addresses: Vec<Address>,
}

impl NamespaceRecord {
    fn replica_mut(&mut self, pod: &str) -> Option<&mut ReplicaRecord> {
        self.replicas.iter_mut().find(|r| r.pod.name == pod)
    }
}

#[derive(Default)]
struct State {
    namespaces: HashMap<String, NamespaceRecord>,
    calls: Vec<Op>,
    failing: HashSet<Op>,
}

impl State {
    fn namespace(&self, name: &str) -> Result<&NamespaceRecord, OrchestratorError> {
        self.namespaces
            .get(name)
            .ok_or_else(|| OrchestratorError::NotFound(format!("namespace {name}")))
    }

    fn namespace_mut(&mut self, name: &str) -> Result<&mut NamespaceRecord, OrchestratorError> {
        self.namespaces
            .get_mut(name)
            .ok_or_else(|| OrchestratorError::NotFound(format!("namespace {name}")))
    }
}

/// InMemoryOrchestrator は開発・テスト用のオーケストレータ
///
/// # 使用例
/// ```ignore
/// let orch = Arc::new(InMemoryOrchestrator::new());
/// let ops = AppBuilder::new().orchestrator(orch.clone())/* ... */.build()?;
/// ops.create(&user, &app).await?;
/// orch.deploy("api");
/// orch.add_pod("api", "api-1", &["listening on :8080"]);
/// ```
#[derive(Default)]
pub struct InMemoryOrchestrator {
    state: Mutex<State>,
}

impl InMemoryOrchestrator {
    /// 空の InMemoryOrchestrator を作成
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `op` を履歴に残し、注入された失敗があれば返す
    fn begin(&self, op: Op) -> Result<MutexGuard<'_, State>, OrchestratorError> {
        let mut state = self.lock();
        state.calls.push(op);
        if state.failing.contains(&op) {
            return Err(OrchestratorError::Api(format!("injected failure on {op:?}")));
        }
        Ok(state)
    }

    /// 以降の `op` をすべて Api エラーにする
    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    /// `fail` を取り消す
    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    /// ここまでの呼び出し履歴
    pub fn calls(&self) -> Vec<Op> {
        self.lock().calls.clone()
    }

    /// 呼び出し履歴を空にする
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn namespace_exists(&self, namespace: &str) -> bool {
        self.lock().namespaces.contains_key(namespace)
    }

    /// namespace のアノテーション一覧（namespace が無ければ None）
    pub fn annotations(&self, namespace: &str) -> Option<BTreeMap<String, String>> {
        self.lock()
            .namespaces
            .get(namespace)
            .map(|ns| ns.annotations.clone())
    }

    pub fn put_annotation(&self, namespace: &str, key: &str, value: &str) {
        if let Some(ns) = self.lock().namespaces.get_mut(namespace) {
            ns.annotations.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_annotation(&self, namespace: &str, key: &str) {
        if let Some(ns) = self.lock().namespaces.get_mut(namespace) {
            ns.annotations.remove(key);
        }
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<BTreeMap<String, Vec<u8>>> {
        self.lock()
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.secrets.get(name).cloned())
    }

    /// アプリの Deployment を作る（ビルドパイプラインの代わり）
    ///
    /// 環境変数は保存済みレコードの値で初期化する。
    pub fn deploy(&self, namespace: &str) {
        let mut state = self.lock();
        if let Some(ns) = state.namespaces.get_mut(namespace) {
            let env = ns
                .annotations
                .get(APP_ANNOTATION)
                .and_then(|raw| serde_json::from_str::<App>(raw).ok())
                .map(|app| app.env_vars)
                .unwrap_or_default();
            ns.deployment = Some(env);
        }
    }

    /// Deployment の環境変数（Deployment が無ければ None）
    pub fn deployment_env(&self, namespace: &str) -> Option<Vec<EnvVar>> {
        self.lock()
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.deployment.clone())
    }

    /// `lines` をログに持つ稼働中のレプリカを追加
    pub fn add_pod(&self, namespace: &str, pod: &str, lines: &[&str]) {
        if let Some(ns) = self.lock().namespaces.get_mut(namespace) {
            ns.replicas.push(ReplicaRecord {
                pod: Pod::running(pod),
                history: lines.iter().map(|l| l.to_string()).collect(),
                followers: Vec::new(),
                fail_open: false,
                broken: false,
            });
        }
    }

    /// このレプリカのログを開くと失敗する
    pub fn fail_pod_logs(&self, namespace: &str, pod: &str) {
        if let Some(r) = self
            .lock()
            .namespaces
            .get_mut(namespace)
            .and_then(|ns| ns.replica_mut(pod))
        {
            r.fail_open = true;
        }
    }

    /// 既存の行を返したあとで読み取りエラーにする
    ///
    /// ストリーム途中でレプリカが消えた状況を再現する。
    pub fn break_pod_after_history(&self, namespace: &str, pod: &str) {
        if let Some(r) = self
            .lock()
            .namespaces
            .get_mut(namespace)
            .and_then(|ns| ns.replica_mut(pod))
        {
            r.broken = true;
        }
    }

    /// ログに 1 行追加し、follow 中の読み手にも届ける
    pub async fn append_log_line(&self, namespace: &str, pod: &str, line: &str) {
        let followers = {
            let mut state = self.lock();
            let Some(r) = state
                .namespaces
                .get_mut(namespace)
                .and_then(|ns| ns.replica_mut(pod))
            else {
                return;
            };
            r.history.push(line.to_string());
            r.followers.clone()
        };

        let data = format!("{line}\n");
        for follower in followers {
            // 読み手は既にいないかもしれない
            let _ = follower.lock().await.write_all(data.as_bytes()).await;
        }
    }

    /// このレプリカを follow している読み手をすべて終端させる
    pub fn end_follow(&self, namespace: &str, pod: &str) {
        if let Some(r) = self
            .lock()
            .namespaces
            .get_mut(namespace)
            .and_then(|ns| ns.replica_mut(pod))
        {
            r.followers.clear();
        }
    }
}

/// 常に失敗する読み取り側
struct BrokenReplica;

impl AsyncRead for BrokenReplica {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "replica went away",
        )))
    }
}

#[async_trait]
impl NamespaceAdmin for InMemoryOrchestrator {
    async fn create_namespace(&self, app: &App, user_email: &str) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::CreateNamespace)?;
        if state.namespaces.contains_key(&app.name) {
            return Err(OrchestratorError::AlreadyExists(format!(
                "namespace {}",
                app.name
            )));
        }
        let encoded =
            serde_json::to_string(app).map_err(|e| OrchestratorError::Api(e.to_string()))?;

        let record = NamespaceRecord {
            labels: BTreeMap::from([(TEAM_LABEL.to_string(), app.team.clone())]),
            annotations: BTreeMap::from([
                (APP_ANNOTATION.to_string(), encoded),
                (LAST_USER_ANNOTATION.to_string(), user_email.to_string()),
            ]),
            addresses: vec![Address {
                hostname: format!("{}.apps.local", app.name),
            }],
            ..NamespaceRecord::default()
        };
        state.namespaces.insert(app.name.clone(), record);
        Ok(())
    }

    async fn create_quota(&self, app: &App) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::CreateQuota)?;
        state.namespace_mut(&app.name)?.quota = Some(app.limits.clone());
        Ok(())
    }

    async fn create_secret(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::CreateSecret)?;
        state
            .namespace_mut(namespace)?
            .secrets
            .insert(name.to_string(), data);
        Ok(())
    }

    async fn create_autoscale(&self, app: &App) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::CreateAutoScale)?;
        state.namespace_mut(&app.name)?.autoscale = Some(app.autoscale.clone());
        Ok(())
    }
}

#[async_trait]
impl NamespaceMetadata for InMemoryOrchestrator {
    async fn label(&self, namespace: &str, key: &str) -> Result<String, OrchestratorError> {
        let state = self.begin(Op::Label)?;
        state
            .namespace(namespace)?
            .labels
            .get(key)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(format!("label {key}")))
    }

    async fn annotation(&self, namespace: &str, key: &str) -> Result<String, OrchestratorError> {
        let state = self.begin(Op::Annotation)?;
        state
            .namespace(namespace)?
            .annotations
            .get(key)
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound(format!("annotation {key}")))
    }

    async fn set_annotations(
        &self,
        namespace: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::SetAnnotations)?;
        state
            .namespace_mut(namespace)?
            .annotations
            .extend(annotations);
        Ok(())
    }
}

#[async_trait]
impl PodLogs for InMemoryOrchestrator {
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, OrchestratorError> {
        let state = self.begin(Op::Pods)?;
        Ok(state
            .namespace(namespace)?
            .replicas
            .iter()
            .map(|r| r.pod.clone())
            .collect())
    }

    async fn logs(
        &self,
        namespace: &str,
        pod: &str,
        opts: LogOptions,
    ) -> Result<LogSource, OrchestratorError> {
        let mut state = self.begin(Op::Logs)?;
        let replica = state
            .namespace_mut(namespace)?
            .replica_mut(pod)
            .ok_or_else(|| OrchestratorError::NotFound(format!("pod {pod}")))?;
        if replica.fail_open {
            return Err(OrchestratorError::Api(format!("log stream of {pod} refused")));
        }

        let skip = replica
            .history
            .len()
            .saturating_sub(usize::try_from(opts.lines).unwrap_or(usize::MAX));
        let tail: String = replica.history[skip..]
            .iter()
            .map(|l| format!("{l}\n"))
            .collect();
        let head = Cursor::new(tail.into_bytes());

        if replica.broken {
            return Ok(Box::new(BufReader::new(head.chain(BrokenReplica))));
        }
        if opts.follow {
            let (writer, reader) = tokio::io::duplex(FOLLOW_PIPE_BYTES);
            replica.followers.push(Arc::new(AsyncMutex::new(writer)));
            return Ok(Box::new(BufReader::new(head.chain(reader))));
        }
        Ok(Box::new(head))
    }
}

#[async_trait]
impl WorkloadStatus for InMemoryOrchestrator {
    async fn addresses(&self, namespace: &str) -> Result<Vec<Address>, OrchestratorError> {
        let state = self.begin(Op::Addresses)?;
        Ok(state.namespace(namespace)?.addresses.clone())
    }

    async fn status(&self, namespace: &str) -> Result<Status, OrchestratorError> {
        let state = self.begin(Op::Status)?;
        let ns = state.namespace(namespace)?;
        Ok(Status {
            cpu: None,
            pods: ns.replicas.iter().map(|r| r.pod.clone()).collect(),
        })
    }

    async fn autoscale(&self, namespace: &str) -> Result<AutoScale, OrchestratorError> {
        let state = self.begin(Op::AutoScale)?;
        state
            .namespace(namespace)?
            .autoscale
            .clone()
            .ok_or_else(|| OrchestratorError::NotFound(format!("autoscale of {namespace}")))
    }

    async fn limits(&self, namespace: &str, name: &str) -> Result<Limits, OrchestratorError> {
        let state = self.begin(Op::Limits)?;
        state
            .namespace(namespace)?
            .quota
            .clone()
            .ok_or_else(|| OrchestratorError::NotFound(format!("limit range {name}")))
    }
}

#[async_trait]
impl DeployEnv for InMemoryOrchestrator {
    async fn create_or_update_env(
        &self,
        namespace: &str,
        deployment: &str,
        vars: &[EnvVar],
    ) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::CreateOrUpdateEnv)?;
        let env = state
            .namespace_mut(namespace)?
            .deployment
            .as_mut()
            .ok_or_else(|| OrchestratorError::NotFound(format!("deployment {deployment}")))?;
        for var in vars {
            match env.iter_mut().find(|cur| cur.key == var.key) {
                Some(cur) => cur.value = var.value.clone(),
                None => env.push(var.clone()),
            }
        }
        Ok(())
    }

    async fn delete_env(
        &self,
        namespace: &str,
        deployment: &str,
        keys: &[String],
    ) -> Result<(), OrchestratorError> {
        let mut state = self.begin(Op::DeleteEnv)?;
        let env = state
            .namespace_mut(namespace)?
            .deployment
            .as_mut()
            .ok_or_else(|| OrchestratorError::NotFound(format!("deployment {deployment}")))?;
        env.retain(|var| !keys.contains(&var.key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    async fn read_all(source: LogSource) -> Vec<String> {
        let mut lines = source.lines();
        let mut out = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn create_namespace_twice_is_already_exists() {
        let orch = InMemoryOrchestrator::new();
        let app = App::new("api", "core");
        orch.create_namespace(&app, "a@example.com").await.unwrap();

        let err = orch.create_namespace(&app, "a@example.com").await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn logs_respect_line_count() {
        let orch = InMemoryOrchestrator::new();
        orch.create_namespace(&App::new("api", "core"), "a@example.com")
            .await
            .unwrap();
        orch.add_pod("api", "p", &["1", "2", "3"]);

        let opts = LogOptions { lines: 2, follow: false };
        assert_eq!(read_all(orch.logs("api", "p", opts).await.unwrap()).await, vec!["2", "3"]);

        let opts = LogOptions { lines: 0, follow: false };
        assert!(read_all(orch.logs("api", "p", opts).await.unwrap()).await.is_empty());
    }

    #[tokio::test]
    async fn env_on_missing_deployment_is_not_found() {
        let orch = InMemoryOrchestrator::new();
        orch.create_namespace(&App::new("api", "core"), "a@example.com")
            .await
            .unwrap();

        let err = orch
            .create_or_update_env("api", "api", &[EnvVar::new("A", "1")])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_are_journaled() {
        let orch = InMemoryOrchestrator::new();
        orch.fail(Op::Pods);

        assert!(orch.pods("api").await.is_err());
        assert_eq!(orch.calls(), vec![Op::Pods]);

        orch.recover(Op::Pods);
        assert!(orch.pods("api").await.unwrap_err().is_not_found());
    }
}
