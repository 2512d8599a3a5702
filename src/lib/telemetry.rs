//! Tracing initialization and structured launch events.
//!
//! This is developer logging on stderr. The Aim UI usage analytics flag lives in
//! `launcher::runtime::analytics`.

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter; the UI server streams to the same terminal, so stay quiet unless asked.
const DEFAULT_FILTER: &str = "warn";

/// Initialize `tracing` and format developer logs.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Payload describing a resolved launch, logged once before any repo work starts.
#[derive(Debug, Serialize)]
pub struct LaunchTelemetry<'a> {
    pub mode: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub workers: u32,
    pub repo_path: &'a str,
    pub tf_logs: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub launch_args: &'a [String],
}

/// Emit the resolved launch to `tracing`.
pub fn emit_launch(telemetry: &LaunchTelemetry<'_>) {
    info!(
        target: "aim_up::runtime",
        mode = telemetry.mode,
        host = telemetry.host,
        port = telemetry.port,
        workers = telemetry.workers,
        repo_path = telemetry.repo_path,
        tf_logs = telemetry.tf_logs.unwrap_or(""),
        config_path = telemetry.config_path.unwrap_or(""),
        launch_args = ?telemetry.launch_args,
        "Resolved launch configuration"
    );
}
