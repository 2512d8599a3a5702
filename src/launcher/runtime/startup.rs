use std::{env, io, process::ExitCode};

use anyhow::Error;

use crate::{
    cli::LaunchConfig,
    launcher::config::LauncherConfig,
    lib::{
        errors::LaunchError,
        process::TokioCommandRunner,
        prompt::TerminalConfirm,
        telemetry::{emit_launch, LaunchTelemetry},
    },
};

use super::{
    environment::{EnvMode, AIM_UI_TELEMETRY_KEY},
    flow::{LaunchOutcome, Launcher},
};

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    /// A failed child's own exit code is passed through when it fits in a process status.
    pub fn from_launch_error(err: LaunchError) -> Self {
        let exit_code = match &err {
            LaunchError::MigrationFailed { exit_code } | LaunchError::ServerFailed { exit_code } => {
                child_exit_code(*exit_code)
            }
            _ => ExitCode::FAILURE,
        };
        Self::new(err.to_string(), exit_code)
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

fn child_exit_code(code: Option<i32>) -> ExitCode {
    match code.and_then(|code| u8::try_from(code).ok()) {
        Some(code) if code != 0 => ExitCode::from(code),
        _ => ExitCode::FAILURE,
    }
}

/// Run a launch against the real terminal, process runner and stdout.
pub async fn run_launcher(
    config: LaunchConfig,
    launcher_config: LauncherConfig,
) -> Result<LaunchOutcome, RuntimeExit> {
    let source_path = launcher_config
        .source_path
        .as_deref()
        .map(|path| path.to_string_lossy().into_owned());
    let repo_path = config.repo_path.clone().unwrap_or_default();
    let tf_logs = config
        .tf_logs
        .as_deref()
        .map(|path| path.to_string_lossy().into_owned());
    emit_launch(&LaunchTelemetry {
        mode: EnvMode::from_dev_flag(config.dev).as_str(),
        host: &config.host,
        port: config.port,
        workers: config.workers,
        repo_path: &repo_path,
        tf_logs: tf_logs.as_deref(),
        config_path: source_path.as_deref(),
        launch_args: &config.launch_args,
    });

    let launcher = Launcher::new(
        config,
        launcher_config.commands,
        TerminalConfirm,
        TokioCommandRunner,
        io::stdout(),
    )
    .with_telemetry_opt_out(env::var(AIM_UI_TELEMETRY_KEY).ok());

    launcher.launch().await.map_err(RuntimeExit::from_launch_error)
}
