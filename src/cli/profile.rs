//! `LaunchConfig` resolution and command-line path validation.
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::launcher::config::UiSection;

/// Resolved startup parameters; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
    /// Raw `--repo` value; cleaned during repo resolution.
    pub repo_path: Option<String>,
    pub tf_logs: Option<PathBuf>,
    pub dev: bool,
    pub launch_args: Vec<String>,
}

/// Flag values as given on the command line, before defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workers: Option<u32>,
    pub repo: Option<String>,
    pub tf_logs: Option<PathBuf>,
    pub dev: bool,
}

/// Merge CLI flags over config-file defaults: flag → `[ui]` → built-in default.
pub fn resolve_launch_config(overrides: LaunchOverrides, ui: &UiSection) -> LaunchConfig {
    let host = overrides.host.unwrap_or_else(|| ui.host.clone());
    let port = overrides.port.unwrap_or(ui.port);
    let workers = overrides.workers.unwrap_or(ui.workers);
    let launch_args = build_launch_args(
        &host,
        port,
        workers,
        overrides.repo.as_deref(),
        overrides.tf_logs.as_deref(),
        overrides.dev,
    );

    LaunchConfig {
        host,
        port,
        workers,
        repo_path: overrides.repo,
        tf_logs: overrides.tf_logs,
        dev: overrides.dev,
        launch_args,
    }
}

/// Flag form of the resolved launch, recorded in the startup `tracing` event.
pub fn build_launch_args(
    host: &str,
    port: u16,
    workers: u32,
    repo: Option<&str>,
    tf_logs: Option<&Path>,
    dev: bool,
) -> Vec<String> {
    let mut args = vec![
        format!("--host={host}"),
        format!("--port={port}"),
        format!("--workers={workers}"),
    ];
    if let Some(repo) = repo {
        args.push(format!("--repo={repo}"));
    }
    if let Some(tf_logs) = tf_logs {
        args.push(format!("--tf_logs={}", tf_logs.display()));
    }
    if dev {
        args.push("--dev".into());
    }
    args
}

/// `--repo` must name an existing directory the launcher can write to.
pub fn parse_existing_writable_dir(raw: &str) -> Result<String, String> {
    let metadata = fs::metadata(raw).map_err(|_| format!("Directory '{raw}' does not exist."))?;
    if !metadata.is_dir() {
        return Err(format!("Directory '{raw}' is a file."));
    }
    if !can_create_file_in(Path::new(raw)) {
        return Err(format!("Directory '{raw}' is not writable."));
    }
    Ok(raw.to_string())
}

/// True when the current user can create a file in `dir`; the check file is removed on drop.
fn can_create_file_in(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".aim-up-write-check")
        .tempfile_in(dir)
        .is_ok()
}

/// `--tf_logs` must name an existing path the launcher can read.
pub fn parse_existing_readable_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    let metadata = fs::metadata(&path).map_err(|_| format!("Path '{raw}' does not exist."))?;
    let readable = if metadata.is_dir() {
        fs::read_dir(&path).is_ok()
    } else {
        fs::File::open(&path).is_ok()
    };
    if !readable {
        return Err(format!("Path '{raw}' is not readable."));
    }
    Ok(path)
}
