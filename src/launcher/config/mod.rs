//! Load and validate the launcher configuration file.
use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::errors::ConfigError;

pub mod commands;
pub mod telemetry;
pub mod ui;

pub use commands::{
    parse_commands_section, CommandsSection, RawCommandsSection, DEFAULT_ALEMBIC_INI,
    DEFAULT_APP, DEFAULT_PYTHON,
};
pub use ui::{parse_ui_section, RawUiSection, UiSection, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WORKERS};

const CONFIG_ENV_KEY: &str = "AIM_UP_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "aim-up.toml";

/// Where the configuration was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Default,
}

/// Top-level configuration container.
#[derive(Debug, Clone, Default)]
pub struct LauncherConfig {
    pub ui: UiSection,
    pub commands: CommandsSection,
    /// `None` when no file was read and built-in defaults apply.
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawLauncherConfig {
    ui: Option<RawUiSection>,
    commands: Option<RawCommandsSection>,
}

impl LauncherConfig {
    /// Resolve the config file in the order: CLI override → `AIM_UP_CONFIG_PATH` → `aim-up.toml`.
    ///
    /// An explicitly named file must load; a missing default file means built-in defaults.
    pub fn load(override_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let (path, source) = match override_path {
            Some(path) => (path, ConfigSource::Cli),
            None => match env::var(CONFIG_ENV_KEY) {
                Ok(value) if !value.trim().is_empty() => (PathBuf::from(value), ConfigSource::Env),
                _ => (PathBuf::from(DEFAULT_CONFIG_PATH), ConfigSource::Default),
            },
        };

        telemetry::log_source(&path, source);
        if source == ConfigSource::Default && !path.is_file() {
            return Ok(Self::default());
        }
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "aim_up::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let builder = config::Config::builder()
            .add_source(config::File::from(path.clone()).format(config::FileFormat::Toml));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "aim_up::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawLauncherConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "aim_up::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "aim_up::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawLauncherConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let ui = parse_ui_section(raw.ui, &path)?;
        let commands = parse_commands_section(raw.commands, &path)?;

        Ok(Self {
            ui,
            commands,
            source_path: Some(path),
        })
    }
}
