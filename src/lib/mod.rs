//! Shared library modules providing error types, file utilities, process execution and telemetry initialization.

pub mod errors;
pub mod fs;
pub mod paths;
pub mod process;
pub mod prompt;
pub mod telemetry;
