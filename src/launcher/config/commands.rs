use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_PYTHON: &str = "python3";
/// Relative to the launcher's working directory, so it only resolves from an Aim source
/// checkout. Installed packages set `alembic_ini` to the path inside site-packages.
pub const DEFAULT_ALEMBIC_INI: &str = "aim/web/migrations/alembic.ini";
pub const DEFAULT_APP: &str = "aim.web.run:app";

/// How the migration and UI server child processes are launched.
///
/// The defaults assume the working directory is an Aim source checkout (see
/// [`DEFAULT_ALEMBIC_INI`]); set `alembic_ini` or `migration` for an installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandsSection {
    pub python: String,
    pub alembic_ini: PathBuf,
    pub app: String,
    /// Full argv replacing the alembic invocation.
    pub migration: Option<Vec<String>>,
    /// Full argv replacing the uvicorn invocation; `{host}`, `{port}` and `{workers}` are substituted.
    pub server: Option<Vec<String>>,
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            alembic_ini: PathBuf::from(DEFAULT_ALEMBIC_INI),
            app: DEFAULT_APP.to_string(),
            migration: None,
            server: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawCommandsSection {
    pub python: Option<String>,
    pub alembic_ini: Option<PathBuf>,
    pub app: Option<String>,
    pub migration: Option<Vec<String>>,
    pub server: Option<Vec<String>>,
}

pub fn parse_commands_section(
    raw: Option<RawCommandsSection>,
    path: &Path,
) -> Result<CommandsSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let defaults = CommandsSection::default();

    let python = raw.python.unwrap_or(defaults.python);
    require_non_blank(&python, "commands.python", path)?;
    let app = raw.app.unwrap_or(defaults.app);
    require_non_blank(&app, "commands.app", path)?;
    let alembic_ini = raw.alembic_ini.unwrap_or(defaults.alembic_ini);
    if alembic_ini.as_os_str().is_empty() {
        return Err(invalid(path, "commands.alembic_ini", "path must not be empty"));
    }

    validate_override(raw.migration.as_deref(), "commands.migration", path)?;
    validate_override(raw.server.as_deref(), "commands.server", path)?;

    Ok(CommandsSection {
        python,
        alembic_ini,
        app,
        migration: raw.migration,
        server: raw.server,
    })
}

fn validate_override(
    argv: Option<&[String]>,
    field: &'static str,
    path: &Path,
) -> Result<(), ConfigError> {
    match argv {
        Some([]) => Err(invalid(path, field, "argv must name a program")),
        Some([program, ..]) => require_non_blank(program, field, path),
        None => Ok(()),
    }
}

fn require_non_blank(value: &str, field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(path, field, "value must not be empty"));
    }
    Ok(())
}

fn invalid(path: &Path, field: &'static str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: message.into(),
    }
}
