//! On-disk repository format version (`.aim/VERSION`).

use std::{fmt, fs, io, path::Path, str::FromStr};

use thiserror::Error;

use crate::lib::{errors::RepoError, fs as repo_fs};

/// File holding the format version inside the `.aim` directory.
pub const VERSION_FILE: &str = "VERSION";

/// Format written by this build.
pub const REPO_FORMAT_VERSION: RepoVersion = RepoVersion::new(3, 2);
/// Assumed when a `.aim` directory carries no version marker (pre-3 layout).
pub const LEGACY_REPO_VERSION: RepoVersion = RepoVersion::new(2, 0);

/// `MAJOR.MINOR` repository format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoVersion {
    pub major: u32,
    pub minor: u32,
}

impl RepoVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for RepoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A version marker that is not `MAJOR[.MINOR[.PATCH]]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{raw}` is not a MAJOR.MINOR version")]
pub struct ParseVersionError {
    raw: String,
}

impl FromStr for RepoVersion {
    type Err = ParseVersionError;

    /// Accepts `MAJOR`, `MAJOR.MINOR` and `MAJOR.MINOR.PATCH`; the patch level is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError {
            raw: raw.trim().to_string(),
        };
        let number = |part: &str| part.parse::<u32>().map_err(|_| invalid());

        let mut parts = raw.trim().split('.');
        let major = number(parts.next().unwrap_or_default())?;
        let minor = match parts.next() {
            Some(part) => number(part)?,
            None => 0,
        };
        if let Some(patch) = parts.next() {
            number(patch)?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(major, minor))
    }
}

/// Read the version marker of the `.aim` directory at `aim_dir`.
pub fn read_version(aim_dir: &Path) -> Result<RepoVersion, RepoError> {
    let path = aim_dir.join(VERSION_FILE);
    match fs::read_to_string(&path) {
        Ok(raw) => raw
            .parse::<RepoVersion>()
            .map_err(|_| RepoError::InvalidVersion {
                path,
                value: raw.trim().to_string(),
            }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(LEGACY_REPO_VERSION),
        Err(source) => Err(RepoError::io(path, source)),
    }
}

/// Overwrite the version marker.
pub fn write_version(aim_dir: &Path, version: RepoVersion) -> Result<(), RepoError> {
    repo_fs::write_atomic(&aim_dir.join(VERSION_FILE), version.to_string().as_bytes())
}
