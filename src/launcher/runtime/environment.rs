//! Environment handed to the migration and server child processes.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use super::analytics::TelemetryFlag;

pub const AIM_ENV_MODE_KEY: &str = "__AIM_ENV_MODE__";
pub const AIM_UI_MOUNTED_REPO_PATH: &str = "__AIM_UI_MOUNTED_REPO_PATH__";
pub const AIM_TF_LOGS_PATH_KEY: &str = "__AIM_TF_LOGS_PATH__";
pub const AIM_UI_TELEMETRY_KEY: &str = "AIM_UI_TELEMETRY_ENABLED";

/// Development or production mode of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Dev,
    Prod,
}

impl EnvMode {
    pub const fn from_dev_flag(dev: bool) -> Self {
        if dev {
            EnvMode::Dev
        } else {
            EnvMode::Prod
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            EnvMode::Dev => "dev",
            EnvMode::Prod => "prod",
        }
    }
}

/// Variables accumulated over a launch. Each setter is called at most once per launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEnvironment {
    mode: EnvMode,
    mounted_repo_path: Option<PathBuf>,
    tf_logs_path: Option<PathBuf>,
    telemetry: Option<TelemetryFlag>,
}

impl LaunchEnvironment {
    pub fn new(mode: EnvMode) -> Self {
        Self {
            mode,
            mounted_repo_path: None,
            tf_logs_path: None,
            telemetry: None,
        }
    }

    pub fn mode(&self) -> EnvMode {
        self.mode
    }

    pub fn mount_repo(&mut self, repo_path: &Path) {
        self.mounted_repo_path = Some(repo_path.to_path_buf());
    }

    pub fn set_tf_logs(&mut self, tf_logs: &Path) {
        self.tf_logs_path = Some(tf_logs.to_path_buf());
    }

    pub fn set_telemetry(&mut self, flag: TelemetryFlag) {
        self.telemetry = Some(flag);
    }

    /// Render as child-process variables; unset entries are absent.
    pub fn vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert(AIM_ENV_MODE_KEY.to_string(), self.mode.as_str().to_string());
        if let Some(path) = &self.mounted_repo_path {
            vars.insert(
                AIM_UI_MOUNTED_REPO_PATH.to_string(),
                path.to_string_lossy().into_owned(),
            );
        }
        if let Some(path) = &self.tf_logs_path {
            vars.insert(
                AIM_TF_LOGS_PATH_KEY.to_string(),
                path.to_string_lossy().into_owned(),
            );
        }
        if let Some(flag) = self.telemetry {
            vars.insert(AIM_UI_TELEMETRY_KEY.to_string(), flag.env_value().to_string());
        }
        vars
    }
}
