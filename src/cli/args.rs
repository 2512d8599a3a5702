//! CLI argument definitions and `LaunchConfig` construction.
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use super::{
    parse_existing_readable_path, parse_existing_writable_dir, resolve_launch_config,
    LaunchConfig, LaunchOverrides,
};
use crate::launcher::config::UiSection;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "aim-up",
    author,
    version,
    about = "Start the Aim UI on a local repository",
    long_about = "Start the Aim UI on a local repository.\n\nChecks the repository format (offering to initialize or upgrade it), runs the UI database migration, then serves the UI until interrupted.",
    disable_help_flag = true
)]
pub struct UpArgs {
    /// Interface the UI server binds to.
    #[arg(short = 'h', long)]
    pub host: Option<String>,
    /// Port the UI server listens on.
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,
    /// Number of UI server worker processes.
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,
    /// Repository root (defaults to the nearest ancestor holding `.aim`, else the current directory).
    #[arg(long, value_parser = parse_existing_writable_dir)]
    pub repo: Option<String>,
    /// TensorBoard logs to expose through the UI.
    #[arg(long = "tf_logs", value_parser = parse_existing_readable_path)]
    pub tf_logs: Option<PathBuf>,
    /// Run the UI in development mode (also disables usage analytics).
    #[arg(long, default_value_t = false)]
    pub dev: bool,
    /// Path to aim-up.toml (overrides AIM_UP_CONFIG_PATH).
    #[arg(long = "config")]
    pub config_override: Option<PathBuf>,
    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl UpArgs {
    pub fn overrides(&self) -> LaunchOverrides {
        LaunchOverrides {
            host: self.host.clone(),
            port: self.port,
            workers: self.workers,
            repo: self.repo.clone(),
            tf_logs: self.tf_logs.clone(),
            dev: self.dev,
        }
    }

    /// Build a `LaunchConfig` from CLI flags over the config file's `[ui]` defaults.
    pub fn into_launch_config(self, ui: &UiSection) -> LaunchConfig {
        resolve_launch_config(self.overrides(), ui)
    }
}
