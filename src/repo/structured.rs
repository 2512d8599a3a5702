//! Structured metadata store (`.aim/structured.json`) and its in-place patch upgrades.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::version::{read_version, write_version, RepoVersion, REPO_FORMAT_VERSION};
use crate::lib::{errors::RepoError, fs as repo_fs};

pub const STRUCTURED_DB_FILE: &str = "structured.json";
pub const LOCKS_DIR: &str = "locks";
pub const DEFAULT_EXPERIMENT: &str = "default";
pub const CURRENT_SCHEMA_REVISION: u32 = 1;

/// Contents of the structured metadata store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    #[serde(default)]
    pub schema_revision: u32,
    #[serde(default)]
    pub experiments: Vec<String>,
    /// Run hash → experiment name.
    #[serde(default)]
    pub runs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_at: Option<DateTime<Utc>>,
}

impl StructuredDocument {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            schema_revision: CURRENT_SCHEMA_REVISION,
            experiments: vec![DEFAULT_EXPERIMENT.to_string()],
            runs: BTreeMap::new(),
            created_at: Some(now),
            upgraded_at: None,
        }
    }

    pub fn record_run(&mut self, experiment: &str, run: &str) {
        if !self.experiments.iter().any(|name| name == experiment) {
            self.experiments.push(experiment.to_string());
        }
        self.runs.insert(run.to_string(), experiment.to_string());
    }
}

/// One minor-version step of the on-disk format.
struct Patch {
    target: RepoVersion,
    name: &'static str,
    apply: fn(&StructuredDb) -> Result<(), RepoError>,
}

const PATCHES: &[Patch] = &[
    Patch {
        target: RepoVersion::new(3, 1),
        name: "add_locks_dir",
        apply: add_locks_dir,
    },
    Patch {
        target: RepoVersion::new(3, 2),
        name: "add_default_experiment",
        apply: add_default_experiment,
    },
];

/// Handle on the structured metadata store of one repository.
#[derive(Debug, Clone)]
pub struct StructuredDb {
    aim_dir: PathBuf,
}

impl StructuredDb {
    pub fn new(aim_dir: impl Into<PathBuf>) -> Self {
        Self {
            aim_dir: aim_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.aim_dir.join(STRUCTURED_DB_FILE)
    }

    /// Load the store; a missing file reads as an empty document.
    pub fn load(&self) -> Result<StructuredDocument, RepoError> {
        let path = self.path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(StructuredDocument::default())
            }
            Err(source) => return Err(RepoError::io(path, source)),
        };
        serde_json::from_slice(&bytes)
            .map_err(|source| RepoError::CorruptStructuredDb { path, source })
    }

    pub fn save(&self, document: &StructuredDocument) -> Result<(), RepoError> {
        let path = self.path();
        let bytes = serde_json::to_vec_pretty(document).map_err(|source| {
            RepoError::CorruptStructuredDb {
                path: path.clone(),
                source,
            }
        })?;
        repo_fs::write_atomic(&path, &bytes)
    }

    /// Apply every pending minor-version patch in order, then stamp the current format.
    ///
    /// Returns the names of the applied patches. Only patches within the repository's
    /// own major version are considered; crossing a major version is a migration.
    pub fn run_upgrades(&self) -> Result<Vec<&'static str>, RepoError> {
        let from = read_version(&self.aim_dir)?;
        let mut applied = Vec::new();

        for patch in pending_patches(from) {
            info!(
                target: "aim_up::repo",
                repo = %self.aim_dir.display(),
                patch = patch.name,
                target_version = %patch.target,
                "Applying repository patch"
            );
            (patch.apply)(self)?;
            applied.push(patch.name);
        }

        let mut document = self.load()?;
        document.upgraded_at = Some(Utc::now());
        self.save(&document)?;
        write_version(&self.aim_dir, REPO_FORMAT_VERSION)?;
        Ok(applied)
    }

    fn aim_dir(&self) -> &Path {
        &self.aim_dir
    }
}

fn pending_patches(from: RepoVersion) -> impl Iterator<Item = &'static Patch> {
    PATCHES.iter().filter(move |patch| {
        patch.target.major == from.major && patch.target > from && patch.target <= REPO_FORMAT_VERSION
    })
}

fn add_locks_dir(db: &StructuredDb) -> Result<(), RepoError> {
    repo_fs::ensure_dir(&db.aim_dir().join(LOCKS_DIR))
}

fn add_default_experiment(db: &StructuredDb) -> Result<(), RepoError> {
    let mut document = db.load()?;
    document.schema_revision = document.schema_revision.max(CURRENT_SCHEMA_REVISION);
    if !document.experiments.iter().any(|name| name == DEFAULT_EXPERIMENT) {
        document.experiments.insert(0, DEFAULT_EXPERIMENT.to_string());
    }
    db.save(&document)
}
