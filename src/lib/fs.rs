//! Filesystem utilities for repository creation, migration and validation.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::lib::errors::RepoError;

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &Path) -> Result<(), RepoError> {
    fs::create_dir_all(path).map_err(|source| RepoError::io(path, source))
}

/// Replace `path` with `contents` through a sibling temp file and a rename, so a
/// crash never leaves a half-written file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), RepoError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(parent).map_err(|source| RepoError::io(parent, source))?;
    staged
        .write_all(contents)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|source| RepoError::io(staged.path().to_path_buf(), source))?;
    staged
        .persist(path)
        .map_err(|err| RepoError::io(path, err.error))?;
    Ok(())
}

/// Recursively copy `source` into `destination`, returning copied files relative to `source`.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<Vec<PathBuf>, RepoError> {
    let mut copied = Vec::new();
    copy_dir_inner(source, source, destination, &mut copied)?;
    copied.sort();
    Ok(copied)
}

fn copy_dir_inner(
    base: &Path,
    current: &Path,
    destination_root: &Path,
    copied: &mut Vec<PathBuf>,
) -> Result<(), RepoError> {
    let relative_dir = current.strip_prefix(base).unwrap_or(current);
    ensure_dir(&destination_root.join(relative_dir))?;

    let entries = fs::read_dir(current).map_err(|source| RepoError::io(current, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| RepoError::io(current, source))?;
        let path = entry.path();
        if path.is_dir() {
            copy_dir_inner(base, &path, destination_root, copied)?;
        } else {
            let relative = path.strip_prefix(base).unwrap_or(&path).to_path_buf();
            let target = destination_root.join(&relative);
            fs::copy(&path, &target).map_err(|source| RepoError::io(&path, source))?;
            copied.push(relative);
        }
    }
    Ok(())
}

/// Return the SHA256 of any file as a hex string.
pub fn compute_sha256(path: &Path) -> Result<String, RepoError> {
    let mut file = File::open(path).map_err(|source| RepoError::io(path, source))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|source| RepoError::io(path, source))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &Path) -> Result<(), RepoError> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_dir_all(path).map_err(|source| RepoError::io(path, source))
}
