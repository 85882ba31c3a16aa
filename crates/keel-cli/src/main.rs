use std::sync::Arc;

use keel_core::app::{AppBuilder, Operations};
use keel_core::config::Config;
use keel_core::domain::{App, EnvVar, Team, User};
use keel_core::impls::{InMemoryOrchestrator, InMemoryTeamDirectory};
use tokio::time::{Duration, sleep};
use tracing::{error, info};

/// インメモリ実装でアプリ 1 つのライフサイクルを一通り動かす
///
/// 作成 → 環境変数の変更 → info 表示 → 3 レプリカのログを follow
#[tokio::main]
async fn main() {
    // (A) 設定（第 1 引数に TOML ファイルを指定可能）
    let config = match std::env::args().nth(1) {
        Some(path) => match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("config {path}: {e}");
                std::process::exit(2);
            }
        },
        None => Config::default(),
    };
    config.logging.init();

    // (B) アダプタを用意してワイヤリング
    let orch = Arc::new(InMemoryOrchestrator::new());
    let directory = Arc::new(InMemoryTeamDirectory::new());
    let ada = User::new("ada@example.com", "Ada");
    directory.add_team(Team::new("core").with_user(ada.clone()));

    let ops = match AppBuilder::new()
        .orchestrator(orch.clone())
        .team_directory(directory)
        .configure(&config)
        .build()
    {
        Ok(ops) => ops,
        Err(e) => {
            error!(error = %e, "wiring failed");
            std::process::exit(1);
        }
    };

    // (C) アプリを作成し、ビルドパイプラインの代わりに deploy
    let app = App::new("hello", "core").with_env_var("GREETING", "hi");
    if let Err(e) = ops.create(&ada, &app).await {
        error!(error = %e, "create failed");
        return;
    }
    orch.deploy(&app.name);

    // (D) 環境変数（保護キーは拒否される）
    let evs = [EnvVar::new("GREETING", "hello"), EnvVar::new("MODE", "demo")];
    if let Err(e) = ops.set_env(&ada, &app.name, &evs).await {
        error!(error = %e, "set env failed");
    }
    if let Err(e) = ops.set_env(&ada, &app.name, &[EnvVar::new("PORT", "80")]).await {
        info!(error = %e, "protected key rejected as expected");
    }

    // (E) レプリカを用意
    orch.add_pod(&app.name, "hello-1", &["booting", "listening on :5000"]);
    orch.add_pod(&app.name, "hello-2", &["booting"]);
    orch.add_pod(&app.name, "hello-3", &["booting"]);

    match ops.info(&ada, &app.name).await {
        Ok(info) => match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{json}"),
            Err(e) => error!(error = %e, "encode info failed"),
        },
        Err(e) => error!(error = %e, "info failed"),
    }

    // (F) ログを follow し、数行追加してからレプリカを止める
    let mut stream = match ops
        .logs(&ada, &app.name, config.logs.default_tail_lines, true)
        .await
    {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "logs failed");
            return;
        }
    };

    // 全レプリカに履歴があるので、それを読み終えた時点で各ワーカーは
    // follow 用パイプにつながっている
    for _ in 0..4 {
        match stream.next_line().await {
            Some(line) => println!("{line}"),
            None => return,
        }
    }

    let feeder = tokio::spawn({
        let orch = orch.clone();
        let name = app.name.clone();
        async move {
            for i in 0..3 {
                sleep(Duration::from_millis(50)).await;
                orch.append_log_line(&name, "hello-3", &format!("request {i}"))
                    .await;
            }
            for pod in ["hello-1", "hello-2", "hello-3"] {
                orch.end_follow(&name, pod);
            }
        }
    });

    while let Some(line) = stream.next_line().await {
        println!("{line}");
    }
    let _ = feeder.await;
    info!(app = %app.name, "log stream ended");
}
