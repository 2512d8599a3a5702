//! CLI entrypoint module structure.

pub mod args;
pub mod profile;

pub use args::UpArgs;
pub use profile::{
    build_launch_args, parse_existing_readable_path, parse_existing_writable_dir,
    resolve_launch_config, LaunchConfig, LaunchOverrides,
};
