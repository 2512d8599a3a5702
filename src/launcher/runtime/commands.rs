//! Builders for the two child commands: the UI database migration and the UI server.

use crate::{
    launcher::config::CommandsSection,
    lib::{errors::CommandError, process::CommandSpec},
};

use super::environment::{EnvMode, LaunchEnvironment};

/// `python -m alembic -c <ini> upgrade head`, unless the config overrides the argv.
pub fn build_migration_command(
    commands: &CommandsSection,
    environment: &LaunchEnvironment,
) -> Result<CommandSpec, CommandError> {
    let argv = match &commands.migration {
        Some(argv) => argv.clone(),
        None => vec![
            commands.python.clone(),
            "-m".into(),
            "alembic".into(),
            "-c".into(),
            commands.alembic_ini.to_string_lossy().into_owned(),
            "upgrade".into(),
            "head".into(),
        ],
    };
    Ok(CommandSpec::from_argv(argv)?.with_env(environment.vars()))
}

/// `python -m uvicorn --host H --port P --workers W [--log-level error] <app>`.
///
/// Production mode keeps uvicorn's own access log quiet. A configured override argv
/// gets `{host}`, `{port}` and `{workers}` substituted instead.
pub fn build_server_command(
    commands: &CommandsSection,
    host: &str,
    port: u16,
    workers: u32,
    environment: &LaunchEnvironment,
) -> Result<CommandSpec, CommandError> {
    let argv = match &commands.server {
        Some(argv) => argv
            .iter()
            .map(|arg| {
                arg.replace("{host}", host)
                    .replace("{port}", &port.to_string())
                    .replace("{workers}", &workers.to_string())
            })
            .collect(),
        None => {
            let mut argv = vec![
                commands.python.clone(),
                "-m".into(),
                "uvicorn".into(),
                "--host".into(),
                host.to_string(),
                "--port".into(),
                port.to_string(),
                "--workers".into(),
                workers.to_string(),
            ];
            if environment.mode() == EnvMode::Prod {
                argv.push("--log-level".into());
                argv.push("error".into());
            }
            argv.push(commands.app.clone());
            argv
        }
    };
    Ok(CommandSpec::from_argv(argv)?.with_env(environment.vars()))
}
