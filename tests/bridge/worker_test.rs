//! End-to-end contract tests driving the real courier-worker binary.
//!
//! The worker must emit exactly one schema-valid envelope on stdout and
//! exit 0 no matter what happens underneath. The configs used here point
//! the upstream endpoint at an unroutable local address, so the network
//! call fails fast without any external dependency.

use std::process::{Command, Output};

use courier::bridge::{Envelope, Status};
use tempfile::TempDir;

const WORKER_BIN: &str = env!("CARGO_BIN_EXE_courier-worker");

const UNREACHABLE_CONFIG: &str = r#"
[api]
endpoint = "http://127.0.0.1:1/v1/chat/completions"
model = "test-model"
connect_timeout_secs = 2
"#;

fn run_worker(config: &str, args: &[&str]) -> Output {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("courier.toml");
    std::fs::write(&config_path, config).unwrap();

    Command::new(WORKER_BIN)
        .args(args)
        .env("COURIER_CONFIG", &config_path)
        .output()
        .expect("failed to run courier-worker")
}

fn decode_stdout(output: &Output) -> Envelope {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.lines().count(),
        1,
        "stdout must hold exactly one line, got: {stdout:?}"
    );
    Envelope::decode(&stdout).expect("stdout is not a valid envelope")
}

#[test]
fn unreachable_upstream_yields_failed_envelope_and_exit_zero() {
    let output = run_worker(UNREACHABLE_CONFIG, &["ping"]);

    assert!(output.status.success(), "worker must exit 0 on failure");
    let envelope = decode_stdout(&output);
    assert_eq!(envelope.status, Status::Failed);
    assert!(
        envelope.msg.contains("connection"),
        "connectivity fault should be described: {}",
        envelope.msg
    );
}

#[test]
fn missing_argument_still_yields_an_envelope() {
    let output = run_worker(UNREACHABLE_CONFIG, &[]);

    assert!(output.status.success());
    let envelope = decode_stdout(&output);
    assert_eq!(envelope.status, Status::Failed);
}

#[test]
fn empty_argument_still_yields_an_envelope() {
    let output = run_worker(UNREACHABLE_CONFIG, &[""]);

    assert!(output.status.success());
    let envelope = decode_stdout(&output);
    assert_eq!(envelope.status, Status::Failed);
}

#[test]
fn broken_config_becomes_an_in_band_failure() {
    let output = run_worker("this is [not valid toml", &["ping"]);

    assert!(output.status.success());
    let envelope = decode_stdout(&output);
    assert_eq!(envelope.status, Status::Failed);
    assert!(envelope.msg.contains("configuration"), "msg: {}", envelope.msg);
}

#[test]
fn unusable_api_key_becomes_an_in_band_failure() {
    let config = r#"
[api]
endpoint = "http://127.0.0.1:1/v1/chat/completions"
api_key = "bad\nkey"
"#;
    let output = run_worker(config, &["ping"]);

    assert!(output.status.success());
    let envelope = decode_stdout(&output);
    assert_eq!(envelope.status, Status::Failed);
    assert!(envelope.msg.contains("api key"), "msg: {}", envelope.msg);
}

#[test]
fn diagnostics_never_contaminate_the_result_channel() {
    // Even with verbose logging enabled, stdout stays a single envelope.
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("courier.toml");
    std::fs::write(&config_path, UNREACHABLE_CONFIG).unwrap();

    let output = Command::new(WORKER_BIN)
        .arg("ping")
        .env("COURIER_CONFIG", &config_path)
        .env("RUST_LOG", "debug")
        .output()
        .expect("failed to run courier-worker");

    assert!(output.status.success());
    let _ = decode_stdout(&output);
}
