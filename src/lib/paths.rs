//! Path helpers for locating and normalizing Aim repository roots.

use std::{
    env,
    ffi::OsString,
    io,
    path::{Component, Path, PathBuf},
};

/// Directory name holding repository data under a repo root.
pub const AIM_DIR_NAME: &str = ".aim";
/// Environment variable name for user home directory.
const HOME_ENV: &str = "HOME";

/// Clean a user-supplied repository path.
///
/// Returns `Ok(None)` for blank input. Otherwise expands a leading `~`, makes the
/// path absolute against the current directory, removes `.`/`..` lexically and
/// drops a trailing `.aim` component so both `/data` and `/data/.aim` name the
/// same repo root.
pub fn clean_repo_path(raw: &str) -> io::Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    Ok(clean_repo_path_from(raw, &cwd, env::var_os(HOME_ENV)))
}

/// Clean a repository path from explicit environment values (testable helper).
fn clean_repo_path_from(raw: &str, cwd: &Path, home: Option<OsString>) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let expanded = match (trimmed.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(trimmed),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    let mut cleaned = normalize_lexically(&absolute);
    if cleaned.file_name().and_then(|name| name.to_str()) == Some(AIM_DIR_NAME) {
        cleaned.pop();
    }
    Some(cleaned)
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Default repository root: the nearest ancestor of the current directory holding
/// a `.aim` directory, or the current directory itself when none does.
pub fn default_repo_path() -> io::Result<PathBuf> {
    let cwd = env::current_dir()?;
    Ok(search_aim_repo(&cwd).unwrap_or(cwd))
}

/// Walk from `start` towards the filesystem root looking for a `.aim` directory.
pub fn search_aim_repo(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(AIM_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
}
