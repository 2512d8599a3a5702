use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 43800;
pub const DEFAULT_WORKERS: u32 = 1;

/// Defaults for the UI server socket and worker pool; CLI flags override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSection {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawUiSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workers: Option<u32>,
}

pub fn parse_ui_section(raw: Option<RawUiSection>, path: &Path) -> Result<UiSection, ConfigError> {
    let ui_raw = raw.unwrap_or_default();
    let host = ui_raw.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    if host.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "ui.host",
            message: "host must not be empty".into(),
        });
    }
    let port = ui_raw.port.unwrap_or(DEFAULT_PORT);
    validate_port(port, path)?;
    let workers = ui_raw.workers.unwrap_or(DEFAULT_WORKERS);
    validate_workers(workers, path)?;
    Ok(UiSection {
        host,
        port,
        workers,
    })
}

fn validate_port(port: u16, path: &Path) -> Result<(), ConfigError> {
    if port != 0 {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "ui.port",
        message: "Use a port in the range 1-65535".into(),
    })
}

fn validate_workers(workers: u32, path: &Path) -> Result<(), ConfigError> {
    if workers >= 1 {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "ui.workers",
        message: "At least one worker is required".into(),
    })
}
