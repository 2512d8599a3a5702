//! Major-version migration of a legacy (2.x) repository into the current layout.
//!
//! The legacy layout keeps runs as `.aim/<experiment>/<run>/…`. The converter moves
//! the old `.aim` aside to `.aim_legacy`, initializes a fresh repository and copies
//! each run into `meta/<run>`. Any failure that is not explicitly skipped rolls the
//! repository back to its original state.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use tracing::{error, info, warn};

use super::{structured::StructuredDocument, Repo, META_DIR};
use crate::lib::{errors::RepoError, fs as repo_fs, paths::AIM_DIR_NAME};

/// Sibling directory the legacy `.aim` is moved to during migration.
pub const LEGACY_DIR_NAME: &str = ".aim_legacy";

/// Knobs of a version migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Delete the legacy backup after a successful migration.
    pub drop_existing: bool,
    /// Log and skip runs that fail to convert instead of aborting.
    pub skip_failed_runs: bool,
    /// Skip per-file checksum validation of converted runs.
    pub skip_checks: bool,
}

/// Summary of a finished migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub converted: Vec<String>,
    pub skipped: Vec<String>,
    /// Files whose checksum was compared against the legacy copy.
    pub verified_files: usize,
    /// `None` when the backup was dropped.
    pub legacy_backup: Option<PathBuf>,
}

#[derive(Debug)]
struct LegacyRun {
    experiment: String,
    name: String,
    path: PathBuf,
}

/// Convert the legacy repository under `root` into the current format.
pub fn migrate_repo_version(
    root: &Path,
    options: MigrationOptions,
) -> Result<(Repo, MigrationReport), RepoError> {
    let aim_dir = root.join(AIM_DIR_NAME);
    if !aim_dir.is_dir() {
        return Err(RepoError::NotFound {
            path: root.to_path_buf(),
        });
    }
    let legacy_dir = root.join(LEGACY_DIR_NAME);
    if legacy_dir.exists() {
        return Err(RepoError::LegacyBackupExists { path: legacy_dir });
    }

    info!(
        target: "aim_up::repo",
        repo = %root.display(),
        drop_existing = options.drop_existing,
        skip_failed_runs = options.skip_failed_runs,
        skip_checks = options.skip_checks,
        "Starting repository version migration"
    );

    fs::rename(&aim_dir, &legacy_dir).map_err(|source| RepoError::io(&aim_dir, source))?;

    let (repo, mut report) = match convert(root, &legacy_dir, options) {
        Ok(converted) => converted,
        Err(err) => {
            rollback(root, &legacy_dir);
            return Err(err);
        }
    };

    if options.drop_existing {
        repo_fs::remove_dir_if_exists(&legacy_dir)?;
    } else {
        report.legacy_backup = Some(legacy_dir);
    }

    info!(
        target: "aim_up::repo",
        repo = %root.display(),
        converted = report.converted.len(),
        skipped = report.skipped.len(),
        "Finished repository version migration"
    );
    Ok((repo, report))
}

fn convert(
    root: &Path,
    legacy_dir: &Path,
    options: MigrationOptions,
) -> Result<(Repo, MigrationReport), RepoError> {
    let repo = Repo::init(root)?;
    let structured = repo.structured_db();
    let mut document: StructuredDocument = structured.load()?;
    let mut report = MigrationReport::default();

    for run in discover_legacy_runs(legacy_dir)? {
        match convert_run(&repo, &run, options.skip_checks) {
            Ok(verified) => {
                document.record_run(&run.experiment, &run.name);
                report.verified_files += verified;
                report.converted.push(run.name);
            }
            Err(err) if options.skip_failed_runs => {
                warn!(
                    target: "aim_up::repo",
                    run = %run.name,
                    experiment = %run.experiment,
                    error = %err,
                    "Skipping run that failed to convert"
                );
                repo_fs::remove_dir_if_exists(&repo.path().join(META_DIR).join(&run.name))?;
                report.skipped.push(run.name);
            }
            Err(err) => return Err(err),
        }
    }

    structured.save(&document)?;
    Ok((repo, report))
}

fn discover_legacy_runs(legacy_dir: &Path) -> Result<Vec<LegacyRun>, RepoError> {
    let mut runs = Vec::new();
    let mut seen = BTreeSet::new();

    for experiment_dir in sorted_subdirs(legacy_dir)? {
        let experiment = dir_name(&experiment_dir);
        for run_dir in sorted_subdirs(&experiment_dir)? {
            let name = dir_name(&run_dir);
            if !seen.insert(name.clone()) {
                return Err(RepoError::RunConversion {
                    run: name,
                    message: "run hash appears in more than one experiment".into(),
                });
            }
            runs.push(LegacyRun {
                experiment: experiment.clone(),
                name,
                path: run_dir,
            });
        }
    }
    Ok(runs)
}

/// Copy one run into `meta/<run>`; returns how many files were checksum-verified.
fn convert_run(repo: &Repo, run: &LegacyRun, skip_checks: bool) -> Result<usize, RepoError> {
    let target = repo.path().join(META_DIR).join(&run.name);
    let copied =
        repo_fs::copy_dir_recursive(&run.path, &target).map_err(|err| RepoError::RunConversion {
            run: run.name.clone(),
            message: err.to_string(),
        })?;

    if skip_checks {
        return Ok(0);
    }
    verify_copied_files(&run.name, &run.path, &target, &copied)
}

fn verify_copied_files(
    run: &str,
    source: &Path,
    target: &Path,
    copied: &[PathBuf],
) -> Result<usize, RepoError> {
    for relative in copied {
        let expected = repo_fs::compute_sha256(&source.join(relative))?;
        let actual = repo_fs::compute_sha256(&target.join(relative))?;
        if expected != actual {
            return Err(RepoError::ValidationFailed {
                run: run.to_string(),
                message: format!("checksum mismatch for {}", relative.display()),
            });
        }
    }
    Ok(copied.len())
}

fn rollback(root: &Path, legacy_dir: &Path) {
    let aim_dir = root.join(AIM_DIR_NAME);
    if let Err(err) = repo_fs::remove_dir_if_exists(&aim_dir) {
        error!(
            target: "aim_up::repo",
            path = %aim_dir.display(),
            error = %err,
            "Failed to remove partially migrated repository"
        );
        return;
    }
    if let Err(err) = fs::rename(legacy_dir, &aim_dir) {
        error!(
            target: "aim_up::repo",
            legacy = %legacy_dir.display(),
            error = %err,
            "Failed to restore legacy repository"
        );
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, RepoError> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| RepoError::io(dir, source))? {
        let entry = entry.map_err(|source| RepoError::io(dir, source))?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    Ok(subdirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
