use std::{fs, path::Path, process::Command, process::Stdio};

use tempfile::tempdir;

use crate::common::BINARY_PATH;

fn write_config(dir: &Path, migration: &str, server: &str) -> std::path::PathBuf {
    let path = dir.join("aim-up.toml");
    fs::write(
        &path,
        format!("[commands]\nmigration = [\"{migration}\"]\nserver = [\"{server}\"]\n"),
    )
    .expect("can write config");
    path
}

#[test]
fn help_lists_launch_options() {
    let output = Command::new(BINARY_PATH)
        .arg("--help")
        .output()
        .expect("binary runs");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--host", "--port", "--workers", "--repo", "--tf_logs", "--dev"] {
        assert!(stdout.contains(flag), "help must list {flag}: {stdout}");
    }
}

#[test]
fn nonexistent_repo_dir_is_rejected_before_launch() {
    let temp = tempdir().expect("can create temp directory");
    let missing = temp.path().join("nope");

    let output = Command::new(BINARY_PATH)
        .arg("--repo")
        .arg(&missing)
        .current_dir(temp.path())
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "stderr: {stderr}");
}

#[test]
fn missing_repo_without_terminal_fails_and_creates_nothing() {
    let temp = tempdir().expect("can create temp directory");
    let config = write_config(temp.path(), "true", "true");

    let output = Command::new(BINARY_PATH)
        .arg("--repo")
        .arg(temp.path())
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .stdin(Stdio::null())
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(!temp.path().join(".aim").exists());
}

#[cfg(unix)]
#[test]
fn valid_repo_runs_migration_then_server() {
    let temp = tempdir().expect("can create temp directory");
    aim_up::repo::Repo::init(temp.path()).expect("can init repo");
    let config = write_config(temp.path(), "true", "true");

    let output = Command::new(BINARY_PATH)
        .arg("--repo")
        .arg(temp.path())
        .arg("--config")
        .arg(&config)
        .env("AIM_UI_TELEMETRY_ENABLED", "0")
        .current_dir(temp.path())
        .stdin(Stdio::null())
        .output()
        .expect("binary runs");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout
        .lines()
        .any(|line| line == "Open http://127.0.0.1:43800"));
    assert!(!stdout.contains("anonymous usage analytics"));
}

#[cfg(unix)]
#[test]
fn failed_migration_stops_before_announcement() {
    let temp = tempdir().expect("can create temp directory");
    aim_up::repo::Repo::init(temp.path()).expect("can init repo");
    let config = write_config(temp.path(), "false", "true");

    let output = Command::new(BINARY_PATH)
        .arg("--repo")
        .arg(temp.path())
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .stdin(Stdio::null())
        .output()
        .expect("binary runs");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to initialize Aim DB"), "stdout: {stdout}");
    assert!(!stdout.contains("Open http"));
}
