// tests/orchestrator_flow.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ocp_provision::collab::{INSTALL_CONFIG_FILE, StaticEnv};
use ocp_provision::config::ConfigFile;
use ocp_provision::engine::{InstallReport, Orchestrator, Stage};
use ocp_provision::errors::ProvisionError;
use ocp_provision::extract::Field;
use ocp_provision::types::OutputSource;
use ocp_provision_test_utils::builders::ConfigFileBuilder;
use ocp_provision_test_utils::fake_runner::{FakeRunner, Scripted};
use ocp_provision_test_utils::fakes::{FakeCollaborators, FakeDecryptor, aws_env};
use ocp_provision_test_utils::fixtures::{
    INSTALL_FAILURE_STDERR, INSTALL_LOG, INSTALL_LOG_NO_CONSOLE,
};
use ocp_provision_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

const INSTALLER: &str = "openshift-install";

/// Scratch layout: a plain secrets file and a clusters directory.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secrets.yml"), "pull_secret: '{}'\n").unwrap();
        Self { dir }
    }

    fn secrets(&self) -> PathBuf {
        self.dir.path().join("secrets.yml")
    }

    fn clusters(&self) -> PathBuf {
        self.dir.path().join("clusters")
    }

    fn builder(&self) -> ConfigFileBuilder {
        ConfigFileBuilder::new()
            .secrets_file(&self.secrets())
            .clusters_dir(&self.clusters())
    }
}

fn orchestrator(
    cfg: ConfigFile,
    runner: &FakeRunner,
    fakes: &FakeCollaborators,
    env: StaticEnv,
) -> Orchestrator {
    Orchestrator::new(cfg, Arc::new(runner.clone()), fakes.wire(env)).unwrap()
}

#[tokio::test]
async fn successful_install_runs_every_stage() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let outcome = with_timeout(orch.install()).await.unwrap();
    let work_dir = ws.clusters().join("hub");

    // Execute: direct argv, working dir, credential overlay.
    let requests = runner.requests_for(INSTALLER);
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(
        req.arg_list(),
        [
            "create".to_string(),
            "cluster".to_string(),
            format!("--dir={}", work_dir.display()),
            "--log-level=info".to_string(),
        ]
    );
    assert_eq!(req.dir(), Some(work_dir.as_path()));
    let env = req.env_overlay();
    assert_eq!(env.get("AWS_ACCESS_KEY_ID").map(String::as_str), Some("AKIDEXAMPLE"));
    assert_eq!(env.get("AWS_DEFAULT_REGION").map(String::as_str), Some("us-west-2"));
    assert!(req.deadline().is_none());

    // Prepare: zones and rendered file.
    let rendered = fakes.renderer.rendered();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].worker_zones, ["us-west-2a", "us-west-2b", "us-west-2c"]);
    assert_eq!(rendered[0].master_zones.len(), 3);
    assert_eq!(outcome.config_path, work_dir.join(INSTALL_CONFIG_FILE));
    assert!(outcome.config_path.is_file());

    // Extract + Finalize.
    assert_eq!(outcome.cluster, "hub");
    assert_eq!(
        outcome.info.api_server_url.as_deref(),
        Some("https://api.hub.ocp.example.com:6443")
    );
    assert_eq!(outcome.info.username.as_deref(), Some("kubeadmin"));
    assert_eq!(outcome.execution.stdout, INSTALL_LOG);

    let report = InstallReport::new("hub", &Ok(outcome));
    assert!(report.success);
    assert_eq!(report.exit_code, Some(0));
}

#[tokio::test]
async fn missing_credentials_fail_validation_before_anything_runs() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let env = StaticEnv::new().with("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE");
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, env);

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert!(matches!(failure.error, ProvisionError::ConfigValidation(_)));
    assert_eq!(
        failure.error.to_string(),
        "Configuration error: AWS_SECRET_ACCESS_KEY could not be found in environment variables"
    );
    assert!(runner.requests().is_empty());
    assert!(!ws.clusters().exists());
}

#[tokio::test]
async fn encrypted_secrets_need_the_vault_passphrase() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new();
    let fakes = FakeCollaborators::new();
    let env = StaticEnv::new()
        .with("AWS_ACCESS_KEY_ID", "a")
        .with("AWS_SECRET_ACCESS_KEY", "b");
    let orch = orchestrator(ws.builder().encrypted(true).build(), &runner, &fakes, env);

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert!(failure.error.to_string().contains("VAULT_SECRET"));
}

#[tokio::test]
async fn passphrase_is_handed_to_the_decryptor() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().encrypted(true).build(), &runner, &fakes, aws_env());

    orch.install().await.unwrap();
    let calls = fakes.decryptor.calls();
    assert_eq!(calls, vec![(ws.secrets(), Some("vault-pass".to_string()))]);
}

#[tokio::test]
async fn missing_secrets_file_is_a_validation_error() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new();
    let fakes = FakeCollaborators::new();
    let cfg = ws
        .builder()
        .secrets_file(&ws.dir.path().join("nope.yml"))
        .build();
    let orch = orchestrator(cfg, &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert!(failure.error.to_string().contains("nope.yml"));
}

#[tokio::test]
async fn region_falls_back_to_environment() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let env = aws_env().with("AWS_DEFAULT_REGION", "eu-central-1");
    let orch = orchestrator(ws.builder().region(None).build(), &runner, &fakes, env);

    orch.install().await.unwrap();
    let req = &runner.requests_for(INSTALLER)[0];
    assert_eq!(
        req.env_overlay().get("AWS_DEFAULT_REGION").map(String::as_str),
        Some("eu-central-1")
    );
    assert_eq!(fakes.renderer.rendered()[0].region, "eu-central-1");
}

#[tokio::test]
async fn unresolved_region_is_a_validation_error() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new();
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().region(None).build(), &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert!(
        failure
            .error
            .to_string()
            .contains("AWS region needs to be specified")
    );
}

#[tokio::test]
async fn offline_token_is_exchanged_when_pull_secret_is_absent() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new().decryptor(FakeDecryptor::new("rh_offline_token: tok-123\n"));
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let outcome = orch.install().await.unwrap();
    assert_eq!(fakes.pull_secrets.tokens(), vec!["tok-123".to_string()]);

    let rendered = std::fs::read_to_string(&outcome.config_path).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(doc["pullSecret"], r#"{"auths":{"fetched":{}}}"#);
}

#[tokio::test]
async fn secrets_without_pull_secret_or_token_fail_validation() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new();
    let fakes = FakeCollaborators::new().decryptor(FakeDecryptor::new("other: value\n"));
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Validate);
    assert!(matches!(failure.error, ProvisionError::ConfigValidation(_)));
    assert!(fakes.pull_secrets.tokens().is_empty());
}

#[tokio::test]
async fn ssh_key_is_read_from_file_when_not_inline() {
    init_tracing();
    let ws = Workspace::new();
    let key_path = ws.dir.path().join("id.pub");
    std::fs::write(&key_path, "ssh-ed25519 AAAAfile me@host\n").unwrap();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let cfg = ws.builder().ssh_pubkey(None).ssh_pubkey_file(&key_path).build();
    let orch = orchestrator(cfg, &runner, &fakes, aws_env());

    orch.install().await.unwrap();
    assert_eq!(fakes.renderer.rendered()[0].ssh_pubkey, "ssh-ed25519 AAAAfile me@host");
}

#[tokio::test]
async fn nonzero_exit_fails_execute_with_stderr_tail() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(
        INSTALLER,
        Scripted::exit(1, "INFO Creating infrastructure resources...\n", INSTALL_FAILURE_STDERR),
    );
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Execute);
    assert!(matches!(failure.error, ProvisionError::Execution { .. }));
    assert!(failure.error.is_retryable());

    let captured = failure.captured().unwrap();
    assert_eq!(captured.exit_code, 1);
    assert_eq!(captured.stderr, INSTALL_FAILURE_STDERR);

    let report = InstallReport::new("hub", &Err(failure));
    assert!(!report.success);
    assert_eq!(report.failed_stage, Some(Stage::Execute));
    assert_eq!(report.exit_code, Some(1));
    assert!(report.stderr_tail.contains("Bootstrap failed to complete"));
    assert!(report.message.contains("exited with code 1"));
}

#[tokio::test]
async fn missing_installer_fails_execute_with_spawn_error() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new();
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Execute);
    assert!(matches!(failure.error, ProvisionError::Spawn { .. }));
    assert!(!failure.error.is_retryable());
    assert!(failure.captured().is_none());
    // Prepare already ran.
    assert!(ws.clusters().join("hub").join(INSTALL_CONFIG_FILE).is_file());
}

#[tokio::test]
async fn deadline_is_forwarded_and_timeout_keeps_partial_output() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(
        INSTALLER,
        Scripted::TimedOut {
            stdout: "INFO Creating infrastructure resources...\n".into(),
        },
    );
    let fakes = FakeCollaborators::new();
    let cfg = ws.builder().timeout(Duration::from_secs(90)).build();
    let orch = orchestrator(cfg, &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Execute);
    assert_eq!(
        runner.requests_for(INSTALLER)[0].deadline(),
        Some(Duration::from_secs(90))
    );
    match &failure.error {
        ProvisionError::Timeout { partial, .. } => {
            assert_eq!(partial.stdout, "INFO Creating infrastructure resources...\n")
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn strict_extraction_failure_carries_the_installer_output() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG_NO_CONSOLE));
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let failure = orch.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Extract);
    assert!(matches!(
        failure.error,
        ProvisionError::Extraction(Field::WebConsoleUrl)
    ));
    assert_eq!(failure.captured().unwrap().stdout, INSTALL_LOG_NO_CONSOLE);
}

#[tokio::test]
async fn lenient_extraction_reports_absent_fields() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG_NO_CONSOLE));
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().strict(false).build(), &runner, &fakes, aws_env());

    let outcome = orch.install().await.unwrap();
    assert_eq!(outcome.info.web_console_url, None);
    assert_eq!(outcome.info.missing(), vec![Field::WebConsoleUrl]);
}

#[tokio::test]
async fn scan_source_decides_whether_stderr_is_mined() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::exit(0, "", INSTALL_LOG));
    let fakes = FakeCollaborators::new();

    let stdout_only = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());
    let failure = stdout_only.install().await.unwrap_err();
    assert_eq!(failure.stage, Stage::Extract);

    let combined = orchestrator(
        ws.builder().scan(OutputSource::Combined).build(),
        &runner,
        &fakes,
        aws_env(),
    );
    let outcome = combined.install().await.unwrap();
    assert_eq!(outcome.info.password.as_deref(), Some("xyz123-AbCd-EfGh-IjKl"));
}

#[tokio::test]
async fn prepare_only_renders_without_running_the_installer() {
    init_tracing();
    let ws = Workspace::new();
    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().replicas(2, 1).build(), &runner, &fakes, aws_env());

    let prepared = orch.prepare_only().await.unwrap();
    assert!(runner.requests().is_empty());
    assert!(Path::new(&prepared.config_path).is_file());
    assert_eq!(prepared.worker_zones, ["us-west-2a", "us-west-2b"]);
    assert_eq!(prepared.master_zones, ["us-west-2a"]);
}

#[tokio::test]
async fn rerun_reuses_the_working_directory() {
    init_tracing();
    let ws = Workspace::new();
    let work_dir = ws.clusters().join("hub");
    std::fs::create_dir_all(&work_dir).unwrap();
    std::fs::write(work_dir.join(INSTALL_CONFIG_FILE), "apiVersion: v1\nmetadata: [").unwrap();

    let runner = FakeRunner::new().respond(INSTALLER, Scripted::ok(INSTALL_LOG));
    let fakes = FakeCollaborators::new();
    let orch = orchestrator(ws.builder().build(), &runner, &fakes, aws_env());

    let outcome = orch.install().await.unwrap();
    let text = std::fs::read_to_string(outcome.config_path).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(doc["metadata"]["name"], "hub");
}
