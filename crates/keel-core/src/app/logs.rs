//! LogAggregator - 全レプリカのログを 1 本のストリームに集約
//!
//! レプリカごとに 1 つのワーカーが、行に `[<pod>] - ` を付けて
//! 全ワーカー共有の bounded チャネルへ書き込む。最後のワーカーが
//! 終わると送信側が閉じ、読み手にはストリームの終端として見える。
//!
//! # 学習ポイント
//! - mpsc による fan-in と背圧（読み手が遅ければワーカーが待つ）
//! - `tokio::select!` で「次の行」と「読み手が閉じた」を同時に待つ
//! - Drop ガードでワーカー数を数える
//!
//! # 保証
//! - 同じレプリカの行は順序を保つ（レプリカ間は自由に混ざる）
//! - [`LogStream`] を閉じる / drop すると、待機中の follow ワーカーも含めて全員終了する
//! - 失敗したレプリカはログに残し、そのワーカーだけが止まる
//! - 不正な UTF-8 は置換文字にして読み続ける

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info_span};

use super::permission::PermissionGuard;
use crate::domain::{KeelError, User};
use crate::ports::{LogOptions, PodLogs};

/// 集約ログの読み取り側
///
/// # 使用例
/// ```ignore
/// let mut stream = ops.logs(&user, "api", 10, true).await?;
/// while let Some(line) = stream.next_line().await {
///     println!("{line}");
/// }
/// ```
pub struct LogStream {
    rx: mpsc::Receiver<String>,
    outstanding: Arc<AtomicUsize>,
}

impl LogStream {
    /// 次の行（終端なら `None`）
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// まだ動いているワーカーの数
    pub fn outstanding_workers(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// ストリームを閉じる
    ///
    /// ワーカーは閉じたことを検知して終了する。バッファ済みの行は
    /// `next_line` で読み出せる。
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// 終端まで読み切る
    pub async fn collect(mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line().await {
            lines.push(line);
        }
        lines
    }
}

/// ワーカー 1 つが持つ書き込みハンドル
///
/// カウンタは sender より先に減るので、読み手が終端を見た時点で 0 になっている。
struct Producer {
    tx: mpsc::Sender<String>,
    outstanding: Arc<AtomicUsize>,
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

/// LogAggregator はレプリカごとのワーカーを起動する
#[derive(Clone)]
pub struct LogAggregator {
    guard: PermissionGuard,
    pods: Arc<dyn PodLogs>,
    buffer_lines: usize,
}

impl LogAggregator {
    /// 新しい LogAggregator を作成（容量 0 は 1 に切り上げ）
    pub fn new(guard: PermissionGuard, pods: Arc<dyn PodLogs>, buffer_lines: usize) -> Self {
        Self {
            guard,
            pods,
            buffer_lines: buffer_lines.max(1),
        }
    }

    /// 稼働中のレプリカごとにワーカーを起動し、すぐに返す
    ///
    /// `lines` は各レプリカの末尾から読む行数、`follow` なら新しい行も流し続ける。
    pub async fn logs(
        &self,
        user: &User,
        app_name: &str,
        lines: u64,
        follow: bool,
    ) -> Result<LogStream, KeelError> {
        self.guard.authorize(user, app_name).await?;

        let pods = self
            .pods
            .pods(app_name)
            .await
            .map_err(KeelError::internal)?;

        let (tx, rx) = mpsc::channel(self.buffer_lines);
        let outstanding = Arc::new(AtomicUsize::new(pods.len()));
        let opts = LogOptions { lines, follow };

        for pod in pods {
            let producer = Producer {
                tx: tx.clone(),
                outstanding: outstanding.clone(),
            };
            let source = self.pods.clone();
            let namespace = app_name.to_string();
            let span = info_span!("log_worker", app = %namespace, pod = %pod.name);
            tokio::spawn(copy_lines(source, namespace, pod.name, opts, producer).instrument(span));
        }
        // sender を持つのはワーカーだけ。レプリカ 0 ならこの時点で終端
        drop(tx);

        Ok(LogStream { rx, outstanding })
    }
}

/// 1 レプリカ分のログをチャネルへ写す
async fn copy_lines(
    source: Arc<dyn PodLogs>,
    namespace: String,
    pod: String,
    opts: LogOptions,
    producer: Producer,
) {
    let mut reader = match source.logs(&namespace, &pod, opts).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "opening replica log failed");
            return;
        }
    };
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = producer.tx.closed() => {
                debug!("reader closed the stream");
                return;
            }
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                debug!("replica log ended");
                return;
            }
            Ok(_) => {
                let line = decode_line(&buf);
                if producer.tx.send(format!("[{pod}] - {line}")).await.is_err() {
                    debug!("reader closed the stream");
                    return;
                }
            }
            Err(e) => {
                error!(error = %e, "streaming replica log failed");
                return;
            }
        }
    }
}

/// 改行を落として 1 行分のバイト列を文字列にする
///
/// 不正な UTF-8 は U+FFFD に置き換え、その行以降の読み取りは続ける。
fn decode_line(raw: &[u8]) -> std::borrow::Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::metadata_store::MetadataStore;
    use crate::domain::{App, ErrorKind, Pod, Team};
    use crate::impls::{InMemoryOrchestrator, InMemoryTeamDirectory, Op};
    use crate::ports::{LogSource, NamespaceAdmin, OrchestratorError, SystemClock};
    use rstest::rstest;
    use std::time::Duration;

    async fn aggregator(orch: &Arc<InMemoryOrchestrator>, buffer: usize) -> LogAggregator {
        orch.create_namespace(&App::new("api", "core"), "ada@example.com")
            .await
            .unwrap();
        let directory = Arc::new(InMemoryTeamDirectory::new());
        directory.add_team(Team::new("core").with_user(ada()));
        let store = MetadataStore::new(orch.clone(), Arc::new(SystemClock));
        LogAggregator::new(PermissionGuard::new(directory, store), orch.clone(), buffer)
    }

    fn ada() -> User {
        User::new("ada@example.com", "Ada")
    }

    fn lines_of<'a>(all: &'a [String], pod: &str) -> Vec<&'a str> {
        let prefix = format!("[{pod}] - ");
        all.iter()
            .filter_map(|l| l.strip_prefix(prefix.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn zero_replicas_is_empty_stream() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;

        let mut stream = agg.logs(&ada(), "api", 10, false).await.unwrap();
        assert_eq!(stream.next_line().await, None);
        assert_eq!(stream.outstanding_workers(), 0);
    }

    #[tokio::test]
    async fn preserves_order_within_each_replica() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 1).await;
        orch.add_pod("api", "A", &["A1", "A2", "A3"]);
        orch.add_pod("api", "B", &["B1", "B2"]);
        orch.add_pod("api", "C", &["C1"]);

        let all = agg.logs(&ada(), "api", 10, false).await.unwrap().collect().await;

        assert_eq!(all.len(), 6);
        assert_eq!(lines_of(&all, "A"), vec!["A1", "A2", "A3"]);
        assert_eq!(lines_of(&all, "B"), vec!["B1", "B2"]);
        assert_eq!(lines_of(&all, "C"), vec!["C1"]);
    }

    #[tokio::test]
    async fn line_count_takes_the_tail() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.add_pod("api", "A", &["A1", "A2", "A3"]);

        let all = agg.logs(&ada(), "api", 2, false).await.unwrap().collect().await;
        assert_eq!(all, vec!["[A] - A2", "[A] - A3"]);
    }

    #[tokio::test]
    async fn unknown_app_is_not_found_before_listing() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.clear_calls();

        let err = agg.logs(&ada(), "ghost", 10, false).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!orch.calls().contains(&Op::Pods));
    }

    #[tokio::test]
    async fn foreign_user_is_denied_before_listing() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.add_pod("api", "A", &["A1"]);
        orch.clear_calls();

        let bob = User::new("bob@example.com", "Bob");
        let err = agg.logs(&bob, "api", 10, false).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!orch.calls().contains(&Op::Pods));
        assert!(!orch.calls().contains(&Op::Logs));
    }

    #[tokio::test]
    async fn pod_listing_failure_is_internal() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.fail(Op::Pods);

        let err = agg.logs(&ada(), "api", 10, false).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn failing_replica_does_not_affect_siblings() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.add_pod("api", "A", &["A1", "A2"]);
        orch.add_pod("api", "B", &["B1"]);
        orch.add_pod("api", "C", &["C1", "C2"]);
        orch.fail_pod_logs("api", "B");
        orch.break_pod_after_history("api", "C");

        let all = agg.logs(&ada(), "api", 10, false).await.unwrap().collect().await;

        assert_eq!(lines_of(&all, "A"), vec!["A1", "A2"]);
        assert!(lines_of(&all, "B").is_empty());
        assert_eq!(lines_of(&all, "C"), vec!["C1", "C2"]);
    }

    #[tokio::test]
    async fn follow_delivers_new_lines_until_replica_ends() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.add_pod("api", "A", &["A1"]);

        let mut stream = agg.logs(&ada(), "api", 10, true).await.unwrap();
        assert_eq!(stream.next_line().await.as_deref(), Some("[A] - A1"));

        orch.append_log_line("api", "A", "A2").await;
        assert_eq!(stream.next_line().await.as_deref(), Some("[A] - A2"));
        assert_eq!(stream.outstanding_workers(), 1);

        orch.end_follow("api", "A");
        assert_eq!(stream.next_line().await, None);
        assert_eq!(stream.outstanding_workers(), 0);
    }

    #[tokio::test]
    async fn closing_the_stream_stops_idle_followers() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        orch.add_pod("api", "A", &["A1"]);
        orch.add_pod("api", "B", &[]);

        let mut stream = agg.logs(&ada(), "api", 10, true).await.unwrap();
        assert_eq!(stream.next_line().await.as_deref(), Some("[A] - A1"));
        stream.close();

        tokio::time::timeout(Duration::from_secs(2), async {
            while stream.outstanding_workers() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("workers did not stop after close");
    }

    #[tokio::test]
    async fn dropping_the_stream_unblocks_writers() {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 1).await;
        let many: Vec<String> = (0..50).map(|i| format!("L{i}")).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        orch.add_pod("api", "A", &many);

        let stream = agg.logs(&ada(), "api", 100, false).await.unwrap();
        let outstanding = stream.outstanding.clone();
        drop(stream);

        tokio::time::timeout(Duration::from_secs(2), async {
            while outstanding.load(Ordering::Acquire) > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("blocked writer did not exit");
    }

    /// 全レプリカに同じ生バイト列を返す PodLogs
    struct RawLogs {
        pods: Vec<&'static str>,
        bytes: &'static [u8],
    }

    #[async_trait::async_trait]
    impl PodLogs for RawLogs {
        async fn pods(&self, _: &str) -> Result<Vec<Pod>, OrchestratorError> {
            Ok(self.pods.iter().map(|p| Pod::running(*p)).collect())
        }

        async fn logs(
            &self,
            _: &str,
            _: &str,
            _: LogOptions,
        ) -> Result<LogSource, OrchestratorError> {
            Ok(Box::new(std::io::Cursor::new(self.bytes)))
        }
    }

    async fn raw_aggregator(bytes: &'static [u8]) -> LogAggregator {
        let orch = Arc::new(InMemoryOrchestrator::new());
        let agg = aggregator(&orch, 8).await;
        LogAggregator::new(agg.guard, Arc::new(RawLogs { pods: vec!["A"], bytes }), 8)
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_and_reading_continues() {
        let agg = raw_aggregator(b"first\nbad \xff byte\nthird\n").await;

        let all = agg.logs(&ada(), "api", 10, false).await.unwrap().collect().await;
        assert_eq!(
            all,
            vec!["[A] - first", "[A] - bad \u{FFFD} byte", "[A] - third"]
        );
    }

    #[rstest]
    #[case::crlf(b"one\r\ntwo\r\n", &["one", "two"])]
    #[case::no_trailing_newline(b"one\ntwo", &["one", "two"])]
    #[case::empty_line(b"one\n\ntwo\n", &["one", "", "two"])]
    #[tokio::test]
    async fn line_endings_are_stripped(
        #[case] bytes: &'static [u8],
        #[case] expected: &'static [&'static str],
    ) {
        let agg = raw_aggregator(bytes).await;

        let all = agg.logs(&ada(), "api", 10, false).await.unwrap().collect().await;
        assert_eq!(lines_of(&all, "A"), expected);
    }
}
