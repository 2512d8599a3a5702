//! Entry point for aim-up.
use std::process::ExitCode;

use anyhow::Error;
use clap::Parser;
use aim_up::{
    cli::UpArgs,
    launcher::{
        config::LauncherConfig,
        runtime::{self, RuntimeExit},
    },
    lib::telemetry,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = UpArgs::parse();
    let config = LauncherConfig::load(args.config_override.clone())
        .map_err(|err| RuntimeExit::from_error(Error::new(err)))?;
    let launch_config = args.into_launch_config(&config.ui);
    runtime::run_launcher(launch_config, config).await?;
    Ok(())
}
