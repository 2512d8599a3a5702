//! Child process description and the streaming runner used for the migration and server steps.

use std::{collections::BTreeMap, fmt, process::Stdio};

use tokio::process::Command;
use tracing::info;

use crate::lib::errors::CommandError;

/// A fully resolved child command: argv plus the environment it is launched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Split an argv into program and arguments.
    pub fn from_argv(argv: Vec<String>) -> Result<Self, CommandError> {
        let mut iter = argv.into_iter();
        let program = iter.next().ok_or(CommandError::EmptyCommand)?;
        Ok(Self {
            program,
            args: iter.collect(),
            env: BTreeMap::new(),
        })
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure { exit_code: Option<i32> },
}

/// Runs a command to completion with its output attached to the console.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run_streaming(&self, command: &CommandSpec) -> Result<ExitOutcome, CommandError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    async fn run_streaming(&self, command: &CommandSpec) -> Result<ExitOutcome, CommandError> {
        (**self).run_streaming(command).await
    }
}

/// Production runner backed by `tokio::process`; stdio is inherited so output streams live.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run_streaming(&self, command: &CommandSpec) -> Result<ExitOutcome, CommandError> {
        let mut child_command = build_tokio_command(command);

        info!(
            target: "aim_up::process",
            program = %command.program,
            args = ?command.args,
            "Starting child process"
        );

        let mut child = child_command.spawn().map_err(|source| CommandError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        let status = child.wait().await.map_err(|source| CommandError::Wait {
            program: command.program.clone(),
            source,
        })?;

        info!(
            target: "aim_up::process",
            program = %command.program,
            exit_code = status.code(),
            "Child process exited"
        );

        if status.success() {
            Ok(ExitOutcome::Success)
        } else {
            Ok(ExitOutcome::Failure {
                exit_code: status.code(),
            })
        }
    }
}

fn build_tokio_command(command: &CommandSpec) -> Command {
    let mut child_command = Command::new(&command.program);
    child_command.kill_on_drop(true);
    child_command.args(&command.args);
    child_command.envs(&command.env);
    child_command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    child_command
}
