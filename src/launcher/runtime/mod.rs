//! Launch sequence, child commands and process exit handling.
pub mod analytics;
mod announce;
pub mod commands;
pub mod environment;
mod flow;
mod startup;

pub use announce::{build_announcement, ui_url};
pub use flow::{DeclinedAction, LaunchOutcome, Launcher};
pub use startup::{run_launcher, RuntimeExit};
