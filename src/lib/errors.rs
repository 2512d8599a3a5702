use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

use crate::repo::RepoVersion;

/// Errors that can occur while loading or validating the launcher configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures while inspecting, creating, patching or migrating an Aim repository.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Repository version marker {path} is not a valid `MAJOR.MINOR` version: {value:?}")]
    InvalidVersion { path: PathBuf, value: String },
    #[error("Repository {path} uses format {found}, which is newer than the supported {supported}")]
    UnsupportedVersion {
        path: PathBuf,
        found: RepoVersion,
        supported: RepoVersion,
    },
    #[error("No Aim repository found at {path}")]
    NotFound { path: PathBuf },
    #[error("Repository {path} already exists")]
    AlreadyExists { path: PathBuf },
    #[error("I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Structured metadata store {path} is corrupted: {source}")]
    CorruptStructuredDb {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Legacy repository backup {path} already exists; move it away before upgrading")]
    LegacyBackupExists { path: PathBuf },
    #[error("Failed to convert run `{run}`: {message}")]
    RunConversion { run: String, message: String },
    #[error("Converted run `{run}` failed validation: {message}")]
    ValidationFailed { run: String, message: String },
}

impl RepoError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while spawning or waiting on a child process.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command line is empty")]
    EmptyCommand,
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Interactive confirmation could not be obtained.
#[derive(Debug, Error)]
#[error("Failed to read confirmation: {message}")]
pub struct PromptError {
    pub message: String,
}

/// Fatal outcomes of a launch attempt.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("Aim DB migration failed (exit={exit_code:?})")]
    MigrationFailed { exit_code: Option<i32> },
    #[error("Aim UI server failed (exit={exit_code:?})")]
    ServerFailed { exit_code: Option<i32> },
    #[error("Failed to write to the console: {0}")]
    Output(#[from] io::Error),
}
