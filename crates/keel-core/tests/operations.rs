//! インメモリ実装を使った `Operations` ファサードの結合テスト

use std::sync::Arc;

use keel_core::app::{AppBuilder, AppOperations, LIMITS_NAME, Operations};
use keel_core::config::Config;
use keel_core::domain::{App, AutoScale, EnvVar, ErrorKind, Team, User};
use keel_core::impls::{InMemoryOrchestrator, InMemoryTeamDirectory, Op};
use keel_core::ports::APP_ANNOTATION;

struct Harness {
    orch: Arc<InMemoryOrchestrator>,
    ops: AppOperations,
}

fn ada() -> User {
    User::new("ada@example.com", "Ada")
}

fn bob() -> User {
    User::new("bob@example.com", "Bob")
}

fn harness() -> Harness {
    let orch = Arc::new(InMemoryOrchestrator::new());
    let directory = Arc::new(InMemoryTeamDirectory::new());
    directory.add_team(Team::new("core").with_user(ada()));
    directory.add_team(Team::new("web").with_user(bob()));

    let config = Config::parse_toml(
        r#"
        [logs]
        buffer_lines = 4

        [credentials]
        secret_name = "platform-access"
        data = { token = "t0k3n" }
        "#,
    )
    .unwrap();

    let ops = AppBuilder::new()
        .orchestrator(orch.clone())
        .team_directory(directory)
        .configure(&config)
        .build()
        .unwrap();
    Harness { orch, ops }
}

async fn provisioned(app: App) -> Harness {
    let h = harness();
    h.ops.create(&ada(), &app).await.unwrap();
    h.orch.deploy(&app.name);
    h
}

fn stored(h: &Harness, app: &str) -> String {
    h.orch.annotations(app).unwrap()[APP_ANNOTATION].clone()
}

#[tokio::test]
async fn create_provisions_and_records_app() {
    let h = harness();
    h.ops.create(&ada(), &App::new("api", "core")).await.unwrap();

    assert_eq!(h.ops.team_name("api").await.unwrap(), "core");
    assert_eq!(h.ops.get("api").await.unwrap(), App::new("api", "core"));
    assert!(h.ops.has_permission(&ada(), "api").await);
    assert!(!h.ops.has_permission(&bob(), "api").await);
    assert_eq!(
        h.orch.secret("api", "platform-access").unwrap()["token"],
        b"t0k3n".to_vec()
    );
}

#[tokio::test]
async fn create_for_foreign_team_makes_no_calls() {
    let h = harness();
    let err = h
        .ops
        .create(&bob(), &App::new("api", "core"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(h.orch.calls().is_empty());
}

#[tokio::test]
async fn create_existing_app_is_already_exists() {
    let h = provisioned(App::new("api", "core")).await;
    let err = h
        .ops
        .create(&ada(), &App::new("api", "core"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn set_env_twice_keeps_one_entry_and_order() {
    let h = provisioned(
        App::new("api", "core")
            .with_env_var("A", "1")
            .with_env_var("B", "2")
            .with_env_var("C", "3"),
    )
    .await;

    h.ops
        .set_env(&ada(), "api", &[EnvVar::new("B", "first")])
        .await
        .unwrap();
    h.ops
        .set_env(&ada(), "api", &[EnvVar::new("B", "second")])
        .await
        .unwrap();

    let expected = vec![
        EnvVar::new("A", "1"),
        EnvVar::new("B", "second"),
        EnvVar::new("C", "3"),
    ];
    assert_eq!(h.ops.get("api").await.unwrap().env_vars, expected);
    assert_eq!(h.orch.deployment_env("api").unwrap(), expected);
}

#[tokio::test]
async fn protected_batch_leaves_record_byte_for_byte() {
    let h = provisioned(App::new("api", "core").with_env_var("A", "1")).await;
    let before = stored(&h, "api");

    let err = h
        .ops
        .set_env(
            &ada(),
            "api",
            &[EnvVar::new("A", "2"), EnvVar::new("PORT", "8080")],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtectedEnvVar);

    let err = h
        .ops
        .unset_env(&ada(), "api", &["A".to_string(), "APP".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtectedEnvVar);

    assert_eq!(stored(&h, "api"), before);
}

#[tokio::test]
async fn unset_missing_key_changes_nothing() {
    let h = provisioned(
        App::new("api", "core")
            .with_env_var("A", "1")
            .with_env_var("B", "2"),
    )
    .await;

    h.ops
        .unset_env(&ada(), "api", &["NOPE".to_string()])
        .await
        .unwrap();

    let app = h.ops.get("api").await.unwrap();
    assert_eq!(app.env_vars, vec![EnvVar::new("A", "1"), EnvVar::new("B", "2")]);
}

#[tokio::test]
async fn denied_user_changes_nothing() {
    let h = provisioned(App::new("api", "core").with_env_var("A", "1")).await;
    let before = stored(&h, "api");
    let live_before = h.orch.deployment_env("api");

    let err = h
        .ops
        .set_env(&bob(), "api", &[EnvVar::new("A", "2")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = h
        .ops
        .unset_env(&bob(), "api", &["A".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = h.ops.info(&bob(), "api").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    assert!(h.ops.logs(&bob(), "api", 10, false).await.is_err());

    assert_eq!(stored(&h, "api"), before);
    assert_eq!(h.orch.deployment_env("api"), live_before);
}

#[tokio::test]
async fn logs_merge_replicas_keeping_per_replica_order() {
    let h = provisioned(App::new("api", "core")).await;
    h.orch.add_pod("api", "A", &["A1", "A2", "A3"]);
    h.orch.add_pod("api", "B", &["B1", "B2"]);
    h.orch.add_pod("api", "C", &["C1"]);

    let lines = h
        .ops
        .logs(&ada(), "api", 10, false)
        .await
        .unwrap()
        .collect()
        .await;

    let of = |pod: &str| -> Vec<String> {
        let prefix = format!("[{pod}] - ");
        lines
            .iter()
            .filter_map(|l| l.strip_prefix(prefix.as_str()).map(String::from))
            .collect()
    };
    assert_eq!(lines.len(), 6);
    assert_eq!(of("A"), vec!["A1", "A2", "A3"]);
    assert_eq!(of("B"), vec!["B1", "B2"]);
    assert_eq!(of("C"), vec!["C1"]);
}

#[tokio::test]
async fn logs_without_replicas_end_immediately() {
    let h = provisioned(App::new("api", "core")).await;
    let mut stream = h.ops.logs(&ada(), "api", 10, true).await.unwrap();
    assert_eq!(stream.next_line().await, None);
}

#[tokio::test]
async fn logs_for_unknown_app_is_not_found() {
    let h = harness();
    let err = h.ops.logs(&ada(), "ghost", 10, false).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn info_assembles_record_and_live_state() {
    let mut app = App::new("api", "core").with_env_var("A", "1");
    app.autoscale = AutoScale {
        cpu_target_utilization: 60,
        min: 2,
        max: 5,
    };
    let h = provisioned(app.clone()).await;
    h.orch.add_pod("api", "api-1", &[]);

    let info = h.ops.info(&ada(), "api").await.unwrap();

    assert_eq!(info.team, "core");
    assert_eq!(info.env_vars, app.env_vars);
    assert_eq!(info.autoscale, app.autoscale);
    assert_eq!(info.limits, app.limits);
    assert_eq!(info.status.pods.len(), 1);
    assert_eq!(info.addresses[0].hostname, "api.apps.local");
    assert_eq!(LIMITS_NAME, "limits");
}

#[tokio::test]
async fn info_read_failure_is_internal() {
    let h = provisioned(App::new("api", "core")).await;
    h.orch.fail(Op::Status);

    let err = h.ops.info(&ada(), "api").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[tokio::test]
async fn get_unknown_app_is_not_found() {
    let h = harness();
    assert_eq!(
        h.ops.get("ghost").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        h.ops.team_name("ghost").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
