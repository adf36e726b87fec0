//! Boundary tests for the launcher, run against stub workers.
//!
//! Each stub is a small shell script standing in for courier-worker, so
//! these tests exercise the spawn, timeout, and decode paths without any
//! network dependency. Unix-only because the stubs are shell scripts.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use courier::bridge::{BridgeError, Launcher};
use tempfile::TempDir;

fn stub_worker(dir: &TempDir, name: &str, script: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn ping_through_stub_returns_pong() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "pong-worker",
        "#!/bin/sh\necho '{\"status\":\"SUCCESS\",\"msg\":\"pong\"}'\n",
    );

    let reply = Launcher::new(stub).dispatch("ping").await.unwrap();
    assert!(reply.is_success());
    assert_eq!(reply.message(), "pong");
}

#[tokio::test]
async fn request_text_arrives_as_sole_argument() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "echo-worker",
        "#!/bin/sh\nprintf '{\"status\":\"SUCCESS\",\"msg\":\"%s\"}\\n' \"$1\"\n",
    );

    let reply = Launcher::new(stub).dispatch("hello worker").await.unwrap();
    assert_eq!(reply.message(), "hello worker");
}

#[tokio::test]
async fn failed_envelope_is_a_reply_not_an_error() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "refused-worker",
        "#!/bin/sh\necho '{\"status\":\"FAILED\",\"msg\":\"connection refused by upstream\"}'\n",
    );

    let reply = Launcher::new(stub).dispatch("x").await.unwrap();
    assert!(!reply.is_success());
    assert!(reply.message().contains("connection"));
}

#[tokio::test]
async fn escaped_newlines_survive_the_wire() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "multiline-worker",
        "#!/bin/sh\necho '{\"status\":\"SUCCESS\",\"msg\":\"line1\\nline2\"}'\n",
    );

    let reply = Launcher::new(stub).dispatch("x").await.unwrap();
    assert_eq!(reply.message(), "line1\nline2");
}

#[tokio::test]
async fn stderr_is_captured_as_diagnostics() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "chatty-worker",
        "#!/bin/sh\necho 'resolving credentials' >&2\necho '{\"status\":\"SUCCESS\",\"msg\":\"ok\"}'\necho 'done in 0.1s' >&2\n",
    );

    let reply = Launcher::new(stub).dispatch("x").await.unwrap();
    assert!(reply.diagnostics.contains("resolving credentials"));
    assert!(reply.diagnostics.contains("done in 0.1s"));
    // Nothing from stderr leaks into the result.
    assert_eq!(reply.message(), "ok");
}

#[tokio::test]
async fn slow_worker_is_killed_on_timeout() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("survived");
    let script = format!(
        "#!/bin/sh\necho 'about to stall' >&2\nsleep 2\ntouch {}\necho '{{\"status\":\"SUCCESS\",\"msg\":\"too late\"}}'\n",
        marker.display()
    );
    let stub = stub_worker(&dir, "stalling-worker", &script);

    let launcher = Launcher::new(stub).with_timeout(Duration::from_millis(300));
    let start = Instant::now();
    let err = launcher.dispatch("x").await.unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1), "timeout not enforced");
    match &err {
        BridgeError::Timeout {
            timeout_secs: _,
            diagnostics,
        } => {
            // Stderr written before the stall is still surfaced.
            assert!(diagnostics.contains("about to stall"));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }

    // The worker was killed, not abandoned: its post-sleep step must never
    // run, even after the original sleep would have elapsed.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!marker.exists(), "worker kept running after timeout");
}

#[tokio::test]
async fn garbage_stdout_is_malformed_result() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "garbage-worker",
        "#!/bin/sh\necho 'oops, a stray print'\necho 'trace detail here' >&2\n",
    );

    let err = Launcher::new(stub).dispatch("x").await.unwrap_err();
    match &err {
        BridgeError::MalformedResult {
            raw, diagnostics, ..
        } => {
            assert!(raw.contains("stray print"));
            assert!(diagnostics.contains("trace detail"));
        }
        other => panic!("expected MalformedResult, got {other:?}"),
    }
}

#[tokio::test]
async fn silent_worker_is_malformed_result() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(&dir, "silent-worker", "#!/bin/sh\nexit 0\n");

    let err = Launcher::new(stub).dispatch("x").await.unwrap_err();
    assert!(matches!(err, BridgeError::MalformedResult { .. }));
}

#[tokio::test]
async fn crashing_worker_is_malformed_result_with_diagnostics() {
    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "crashing-worker",
        "#!/bin/sh\necho 'unhandled fault' >&2\nexit 3\n",
    );

    let err = Launcher::new(stub).dispatch("x").await.unwrap_err();
    match &err {
        BridgeError::MalformedResult { diagnostics, .. } => {
            assert!(diagnostics.contains("unhandled fault"));
        }
        other => panic!("expected MalformedResult, got {other:?}"),
    }
    assert_eq!(err.diagnostics(), Some("unhandled fault\n"));
}

#[tokio::test]
async fn missing_binary_is_spawn_failure() {
    let launcher = Launcher::new("/no/such/binary/courier-worker");
    let err = launcher.dispatch("x").await.unwrap_err();
    assert!(matches!(err, BridgeError::SpawnFailed(_)));
    assert!(err.is_spawn_failure());
}

#[tokio::test]
async fn empty_request_is_rejected_before_spawn() {
    // The path does not even need to exist: validation happens first.
    let launcher = Launcher::new("/no/such/binary/courier-worker");
    let err = launcher.dispatch("").await.unwrap_err();
    assert!(matches!(err, BridgeError::EmptyRequest));
}

#[tokio::test]
async fn env_override_replaces_the_host_environment() {
    std::env::set_var("COURIER_TEST_LEAK_CANARY", "leaked");

    let dir = TempDir::new().unwrap();
    let stub = stub_worker(
        &dir,
        "env-worker",
        "#!/bin/sh\nif [ -z \"$COURIER_TEST_LEAK_CANARY\" ]; then\n  echo '{\"status\":\"SUCCESS\",\"msg\":\"clean\"}'\nelse\n  echo '{\"status\":\"SUCCESS\",\"msg\":\"leaked\"}'\nfi\n",
    );

    let mut env = BTreeMap::new();
    env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());

    let reply = Launcher::new(&stub)
        .with_env(env)
        .dispatch("x")
        .await
        .unwrap();
    assert_eq!(reply.message(), "clean");

    // Without the override the variable is inherited.
    let reply = Launcher::new(&stub).dispatch("x").await.unwrap();
    assert_eq!(reply.message(), "leaked");

    std::env::remove_var("COURIER_TEST_LEAK_CANARY");
}
