//! Aim repository inspection, creation and upgrades.
use std::{
    cmp::Ordering,
    fmt,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::info;

use crate::lib::{errors::RepoError, fs as repo_fs, paths::AIM_DIR_NAME};

pub mod structured;
pub mod upgrade;
pub mod version;

pub use structured::{StructuredDb, StructuredDocument};
pub use upgrade::{migrate_repo_version, MigrationOptions, MigrationReport, LEGACY_DIR_NAME};
pub use version::{ParseVersionError, RepoVersion, LEGACY_REPO_VERSION, REPO_FORMAT_VERSION};

/// Per-run data directory inside `.aim`.
pub const META_DIR: &str = "meta";

/// Compatibility of an on-disk repository with this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    /// No `.aim` directory at the root.
    Missing,
    /// Current format.
    Valid,
    /// Older major version; needs a version migration.
    UpdateRequired,
    /// Same major, older minor; needs in-place patches.
    PatchRequired,
}

impl RepoStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RepoStatus::Missing => "missing",
            RepoStatus::Valid => "valid",
            RepoStatus::UpdateRequired => "update_required",
            RepoStatus::PatchRequired => "patch_required",
        }
    }
}

/// Handle on an opened repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    root: PathBuf,
    version: RepoVersion,
}

impl Repo {
    /// Classify the repository rooted at `root`.
    ///
    /// A format newer than [`REPO_FORMAT_VERSION`] has no safe branch and is an error.
    pub fn check_status(root: &Path) -> Result<RepoStatus, RepoError> {
        let aim_dir = root.join(AIM_DIR_NAME);
        if !aim_dir.is_dir() {
            return Ok(RepoStatus::Missing);
        }
        let found = version::read_version(&aim_dir)?;
        classify(found, REPO_FORMAT_VERSION, &aim_dir)
    }

    /// Open an existing repository without changing it.
    pub fn open(root: &Path) -> Result<Self, RepoError> {
        let aim_dir = root.join(AIM_DIR_NAME);
        if !aim_dir.is_dir() {
            return Err(RepoError::NotFound {
                path: root.to_path_buf(),
            });
        }
        let version = version::read_version(&aim_dir)?;
        Ok(Self {
            root: root.to_path_buf(),
            version,
        })
    }

    /// Create a new repository in the current format.
    pub fn init(root: &Path) -> Result<Self, RepoError> {
        let aim_dir = root.join(AIM_DIR_NAME);
        if aim_dir.exists() {
            return Err(RepoError::AlreadyExists { path: aim_dir });
        }

        repo_fs::ensure_dir(&aim_dir)?;
        version::write_version(&aim_dir, REPO_FORMAT_VERSION)?;
        repo_fs::ensure_dir(&aim_dir.join(META_DIR))?;
        repo_fs::ensure_dir(&aim_dir.join(structured::LOCKS_DIR))?;
        StructuredDb::new(&aim_dir).save(&StructuredDocument::fresh(Utc::now()))?;

        info!(
            target: "aim_up::repo",
            path = %aim_dir.display(),
            version = %REPO_FORMAT_VERSION,
            "Initialized repository"
        );
        Ok(Self {
            root: root.to_path_buf(),
            version: REPO_FORMAT_VERSION,
        })
    }

    /// Canonical repository path: the `.aim` directory.
    pub fn path(&self) -> PathBuf {
        self.root.join(AIM_DIR_NAME)
    }

    pub fn version(&self) -> RepoVersion {
        self.version
    }

    pub fn structured_db(&self) -> StructuredDb {
        StructuredDb::new(self.path())
    }

    /// Bring a same-major repository up to the current minor format.
    pub fn apply_patch_upgrades(&mut self) -> Result<Vec<&'static str>, RepoError> {
        let applied = self.structured_db().run_upgrades()?;
        self.version = REPO_FORMAT_VERSION;
        Ok(applied)
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Repo path={} version={}>",
            self.path().display(),
            self.version
        )
    }
}

fn classify(
    found: RepoVersion,
    supported: RepoVersion,
    aim_dir: &Path,
) -> Result<RepoStatus, RepoError> {
    let unsupported = || RepoError::UnsupportedVersion {
        path: aim_dir.to_path_buf(),
        found,
        supported,
    };
    match found.major.cmp(&supported.major) {
        Ordering::Less => Ok(RepoStatus::UpdateRequired),
        Ordering::Greater => Err(unsupported()),
        Ordering::Equal => match found.minor.cmp(&supported.minor) {
            Ordering::Less => Ok(RepoStatus::PatchRequired),
            Ordering::Equal => Ok(RepoStatus::Valid),
            Ordering::Greater => Err(unsupported()),
        },
    }
}
