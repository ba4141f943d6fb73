// tests/process_runner.rs
//
// Runs real child processes through `/bin/sh -c <script>`. The crate itself
// never builds shell strings; the tests use `sh` only as a convenient
// external program.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use ocp_provision::errors::ProvisionError;
use ocp_provision::exec::{ExecutionRequest, ProcessRunner, RecordingSink, Stream};
use ocp_provision_test_utils::{init_tracing, with_timeout};

fn sh(script: &str) -> ExecutionRequest {
    ExecutionRequest::new("/bin/sh").arg("-c").arg(script)
}

#[tokio::test]
async fn large_output_on_both_streams_does_not_deadlock() {
    init_tracing();
    // stderr is filled first: a reader that waited on stdout before touching
    // stderr would stall once the stderr pipe buffer is full.
    let script = "head -c 262144 /dev/zero | tr '\\0' e >&2; head -c 262144 /dev/zero | tr '\\0' o";

    let result = with_timeout(ProcessRunner::new().run(&sh(script)))
        .await
        .unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stderr.len(), 262_144);
    assert_eq!(result.stdout.len(), 262_144);
    assert!(result.stderr.bytes().all(|b| b == b'e'));
    assert!(result.stdout.bytes().all(|b| b == b'o'));
    assert!(!result.truncated);
}

#[tokio::test]
async fn interleaved_small_writes_are_captured_completely() {
    init_tracing();
    let script = "i=0; while [ $i -lt 2000 ]; do echo out-$i; echo err-$i >&2; i=$((i+1)); done";

    let result = with_timeout(ProcessRunner::new().run(&sh(script)))
        .await
        .unwrap();

    let out: Vec<&str> = result.stdout.lines().collect();
    let err: Vec<&str> = result.stderr.lines().collect();
    assert_eq!(out.len(), 2000);
    assert_eq!(err.len(), 2000);
    assert_eq!(out[0], "out-0");
    assert_eq!(out[1999], "out-1999");
    assert_eq!(err[1999], "err-1999");
}

#[tokio::test]
async fn interleaved_writes_beyond_pipe_buffer_keep_every_byte() {
    init_tracing();
    // 4096 rounds of one 64-byte line per channel: 256 KiB on each stream,
    // alternating writes the whole way through.
    let script = "i=0; while [ $i -lt 4096 ]; do printf '%063d\\n' $i; printf '%063d\\n' $i >&2; i=$((i+1)); done";

    let result = with_timeout(ProcessRunner::new().run(&sh(script)))
        .await
        .unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout.len(), 262_144);
    assert_eq!(result.stderr.len(), 262_144);
    assert_eq!(result.stdout.lines().count(), 4096);
    assert_eq!(result.stdout.lines().last(), Some(format!("{:063}", 4095).as_str()));
    assert_eq!(result.stdout, result.stderr);
    assert!(!result.truncated);
}

#[tokio::test]
async fn nonzero_exit_is_reported_not_raised() {
    init_tracing();
    let result = with_timeout(ProcessRunner::new().run(&sh("echo boom >&2; exit 3")))
        .await
        .unwrap();

    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
    assert_eq!(result.stderr, "boom\n");
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error() {
    init_tracing();
    let req = ExecutionRequest::new("/definitely/not/here/openshift-install");
    let err = ProcessRunner::new().run(&req).await.unwrap_err();

    match err {
        ProvisionError::Spawn { binary, .. } => {
            assert_eq!(binary, "/definitely/not/here/openshift-install")
        }
        other => panic!("expected Spawn, got {other:?}"),
    }
}

#[tokio::test]
async fn arguments_are_passed_without_shell_splitting() {
    init_tracing();
    let req = ExecutionRequest::new("/bin/sh")
        .arg("-c")
        .arg("printf '%s|' \"$@\"")
        .arg("sh")
        .arg("a b")
        .arg("$HOME")
        .arg("--dir=/tmp/x y");

    let result = ProcessRunner::new().run(&req).await.unwrap();
    assert_eq!(result.stdout, "a b|$HOME|--dir=/tmp/x y|");
}

#[tokio::test]
async fn working_dir_and_env_overlay_apply() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let req = sh("pwd; printf '%s' \"$OCP_TEST_VALUE\"")
        .working_dir(dir.path())
        .env("OCP_TEST_VALUE", "from-overlay");

    let result = ProcessRunner::new().run(&req).await.unwrap();
    let mut lines = result.stdout.lines();
    let pwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
    assert_eq!(pwd, std::fs::canonicalize(dir.path()).unwrap());
    assert_eq!(lines.next(), Some("from-overlay"));
}

#[tokio::test]
async fn timeout_kills_process_group_and_keeps_partial_output() {
    init_tracing();
    // The background sleep shares the process group; it must not keep the
    // run alive past the deadline.
    let req = sh("echo started; sleep 30 & sleep 30")
        .timeout(Duration::from_millis(300));

    let started = std::time::Instant::now();
    let err = with_timeout(ProcessRunner::new().run(&req)).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(4));

    match err {
        ProvisionError::Timeout {
            timeout, partial, ..
        } => {
            assert_eq!(timeout, Duration::from_millis(300));
            assert_eq!(partial.stdout, "started\n");
            assert_ne!(partial.exit_code, 0);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn finishing_before_deadline_is_a_normal_result() {
    init_tracing();
    let req = sh("echo quick").timeout(Duration::from_secs(5));
    let result = ProcessRunner::new().run(&req).await.unwrap();
    assert_eq!(result.stdout, "quick\n");
}

#[tokio::test]
async fn capture_limit_keeps_the_newest_output() {
    init_tracing();
    let script = "i=0; while [ $i -lt 1000 ]; do echo line-$i; i=$((i+1)); done";
    let runner = ProcessRunner::new().with_capture_limit(Some(100));

    let result = runner.run(&sh(script)).await.unwrap();
    assert!(result.truncated);
    assert!(result.stdout.len() <= 100 + "line-999\n".len());
    assert!(result.stdout.ends_with("line-999\n"));
}

#[tokio::test]
async fn sink_sees_lines_in_emission_order_per_stream() {
    init_tracing();
    let sink = RecordingSink::new();
    let runner = ProcessRunner::new().with_sink(Arc::new(sink.clone()));
    let script = "echo a; echo x >&2; echo b; echo y >&2; printf c";

    runner.run(&sh(script)).await.unwrap();

    assert_eq!(sink.lines_of(Stream::Stdout), vec!["a", "b", "c"]);
    assert_eq!(sink.lines_of(Stream::Stderr), vec!["x", "y"]);
}
