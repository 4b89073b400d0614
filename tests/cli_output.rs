//! Runs the built binary and checks the stdout/stderr split.

use std::process::Command;

use tempfile::TempDir;

fn mail_digest(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mail-digest"));
    cmd.env_remove("GMAIL_ACCESS_TOKEN")
        .env("RUST_LOG", "info")
        .env("OLLAMA_HOST", "http://127.0.0.1:9")
        .env("GMAIL_API_BASE", "http://127.0.0.1:9")
        .env("MAIL_AGENT_DATA_DIR", dir.path().join("data"))
        .env("MAIL_AGENT_DIGEST_DIR", dir.path().join("digests"));
    cmd
}

#[test]
fn logs_go_to_stderr_and_results_to_stdout() {
    let dir = TempDir::new().unwrap();

    let output = mail_digest(&dir)
        .args(["--no-cache", "summary"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout, "No emails to summarize.\n");
    assert!(stderr.contains("Starting mail digest"), "stderr: {stderr}");
}

#[test]
fn zero_hours_is_rejected() {
    let dir = TempDir::new().unwrap();

    let output = mail_digest(&dir)
        .args(["--hours", "0", "summary"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn bad_config_is_reported_on_stderr() {
    let dir = TempDir::new().unwrap();

    let output = mail_digest(&dir)
        .env("MAIL_AGENT_MAX_MESSAGES", "0")
        .arg("summary")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Configuration error: Invalid configuration value for MAIL_AGENT_MAX_MESSAGES"),
        "stderr: {stderr}"
    );
}
