//! The startup decision sequence: repo → migration → analytics notice → server.

use std::{io::Write, path::PathBuf};

use console::style;
use tracing::{error, info};

use crate::{
    cli::LaunchConfig,
    launcher::config::CommandsSection,
    lib::{
        errors::{LaunchError, RepoError},
        paths,
        process::{CommandRunner, CommandSpec, ExitOutcome},
        prompt::Confirm,
    },
    repo::{migrate_repo_version, MigrationOptions, Repo, RepoStatus},
};

use super::{
    analytics::{resolve_telemetry, telemetry_notice_lines},
    announce::build_announcement,
    commands::{build_migration_command, build_server_command},
    environment::{EnvMode, LaunchEnvironment},
};

const MIGRATION_FAILED_NOTICE: &str =
    "Failed to initialize Aim DB. Please see the logs above for details.";
const SERVER_FAILED_NOTICE: &str = "Failed to run Aim UI. Please see the logs above for details.";

/// Action the operator declined; the launch stops without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclinedAction {
    Initialize,
    Upgrade,
}

/// Non-error end of a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The server ran and exited cleanly.
    Served,
    Declined(DeclinedAction),
}

enum RepoPreparation {
    Ready(Repo),
    Declined(DeclinedAction),
}

/// One launch attempt, with its operator prompt, child runner and console injected.
pub struct Launcher<C, R, W> {
    config: LaunchConfig,
    commands: CommandsSection,
    confirm: C,
    runner: R,
    out: W,
    telemetry_opt_out: Option<String>,
}

impl<C, R, W> Launcher<C, R, W>
where
    C: Confirm,
    R: CommandRunner,
    W: Write,
{
    pub fn new(config: LaunchConfig, commands: CommandsSection, confirm: C, runner: R, out: W) -> Self {
        Self {
            config,
            commands,
            confirm,
            runner,
            out,
            telemetry_opt_out: None,
        }
    }

    /// Value of `AIM_UI_TELEMETRY_ENABLED` found in the launcher's own environment.
    pub fn with_telemetry_opt_out(mut self, value: Option<String>) -> Self {
        self.telemetry_opt_out = value;
        self
    }

    pub async fn launch(mut self) -> Result<LaunchOutcome, LaunchError> {
        let mut environment = LaunchEnvironment::new(EnvMode::from_dev_flag(self.config.dev));

        let repo_root = self.resolve_repo_root()?;
        let repo = match self.prepare_repo(repo_root)? {
            RepoPreparation::Ready(repo) => repo,
            RepoPreparation::Declined(action) => return Ok(LaunchOutcome::Declined(action)),
        };

        environment.mount_repo(&repo.path());
        if let Some(tf_logs) = &self.config.tf_logs {
            environment.set_tf_logs(tf_logs);
        }

        let migration = build_migration_command(&self.commands, &environment)?;
        if let ExitOutcome::Failure { exit_code } = self.run_step("migration", &migration).await {
            writeln!(self.out, "{MIGRATION_FAILED_NOTICE}")?;
            return Err(LaunchError::MigrationFailed { exit_code });
        }

        let telemetry = resolve_telemetry(self.config.dev, self.telemetry_opt_out.as_deref());
        environment.set_telemetry(telemetry);
        if telemetry.is_enabled() {
            for line in telemetry_notice_lines() {
                writeln!(self.out, "{line}")?;
            }
        }

        for line in build_announcement(&repo, &self.config.host, self.config.port) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;

        let server = build_server_command(
            &self.commands,
            &self.config.host,
            self.config.port,
            self.config.workers,
            &environment,
        )?;
        if let ExitOutcome::Failure { exit_code } = self.run_step("server", &server).await {
            writeln!(self.out, "{SERVER_FAILED_NOTICE}")?;
            return Err(LaunchError::ServerFailed { exit_code });
        }

        Ok(LaunchOutcome::Served)
    }

    fn resolve_repo_root(&self) -> Result<PathBuf, LaunchError> {
        let cleaned = match self.config.repo_path.as_deref() {
            Some(raw) => paths::clean_repo_path(raw).map_err(|source| RepoError::io(raw, source))?,
            None => None,
        };
        match cleaned {
            Some(root) => Ok(root),
            None => Ok(paths::default_repo_path().map_err(|source| RepoError::io(".", source))?),
        }
    }

    fn prepare_repo(&mut self, root: PathBuf) -> Result<RepoPreparation, LaunchError> {
        let status = Repo::check_status(&root)?;
        info!(
            target: "aim_up::launcher",
            repo = %root.display(),
            status = status.as_str(),
            "Classified repository"
        );

        let display_root = root.display().to_string();
        let repo = match status {
            RepoStatus::Missing => {
                let prompt = format!(
                    "'{display_root}' is not a valid Aim repository. Do you want to initialize it?"
                );
                if !self.confirm.confirm(&prompt)? {
                    writeln!(self.out, "To initialize repo please run the following command:")?;
                    writeln!(self.out, "{}", style("aim init").yellow())?;
                    return Ok(RepoPreparation::Declined(DeclinedAction::Initialize));
                }
                Repo::init(&root)?
            }
            RepoStatus::UpdateRequired => {
                let prompt = format!(
                    "'{display_root}' requires upgrade. Do you want to run upgrade automatically?"
                );
                if !self.confirm.confirm(&prompt)? {
                    writeln!(self.out, "To upgrade repo please run the following command:")?;
                    writeln!(
                        self.out,
                        "{}",
                        style(format!("aim upgrade --repo {display_root} 2to3")).yellow()
                    )?;
                    return Ok(RepoPreparation::Declined(DeclinedAction::Upgrade));
                }
                let options = MigrationOptions {
                    drop_existing: false,
                    skip_failed_runs: false,
                    skip_checks: false,
                };
                let (repo, report) = migrate_repo_version(&root, options)?;
                info!(
                    target: "aim_up::launcher",
                    converted = report.converted.len(),
                    legacy_backup = ?report.legacy_backup,
                    "Upgraded repository"
                );
                repo
            }
            RepoStatus::PatchRequired => {
                let mut repo = Repo::open(&root)?;
                let applied = repo.apply_patch_upgrades()?;
                info!(
                    target: "aim_up::launcher",
                    patches = ?applied,
                    "Patched repository"
                );
                repo
            }
            RepoStatus::Valid => Repo::open(&root)?,
        };
        Ok(RepoPreparation::Ready(repo))
    }

    async fn run_step(&self, step: &'static str, command: &CommandSpec) -> ExitOutcome {
        match self.runner.run_streaming(command).await {
            Ok(outcome) => {
                if let ExitOutcome::Failure { exit_code } = outcome {
                    error!(
                        target: "aim_up::launcher",
                        step,
                        command = %command,
                        exit_code,
                        "Child process failed"
                    );
                }
                outcome
            }
            Err(err) => {
                error!(
                    target: "aim_up::launcher",
                    step,
                    command = %command,
                    error = %err,
                    "Child process could not be run"
                );
                ExitOutcome::Failure { exit_code: None }
            }
        }
    }
}
