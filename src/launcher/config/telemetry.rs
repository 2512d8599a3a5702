use tracing::{debug, info};

use super::{ConfigSource, LauncherConfig, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_source(path: &std::path::Path, source: ConfigSource) {
    match source {
        ConfigSource::Cli => info!(
            target: "aim_up::config",
            path = %path.display(),
            "Loading configuration named by --config"
        ),
        ConfigSource::Env => info!(
            target: "aim_up::config",
            path = %path.display(),
            "Loading configuration using AIM_UP_CONFIG_PATH environment variable"
        ),
        ConfigSource::Default => debug!(
            target: "aim_up::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            exists = path.is_file(),
            "AIM_UP_CONFIG_PATH not set; looking for aim-up.toml"
        ),
    }
}

pub fn log_loaded(config: &LauncherConfig) {
    info!(
        target: "aim_up::config",
        path = %config
            .source_path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
        host = %config.ui.host,
        port = config.ui.port,
        workers = config.ui.workers,
        python = %config.commands.python,
        migration_override = config.commands.migration.is_some(),
        server_override = config.commands.server.is_some(),
        "Configuration file loaded successfully"
    );
}
