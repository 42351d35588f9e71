// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance enforcement: an exclusive lock on a file under the
//! data directory, held for the lifetime of the daemon process.

use fs2::FileExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to acquire lock at {path}: daemon already running?")]
    AlreadyLocked { path: PathBuf, #[source] source: std::io::Error },

    #[error("IO error on lock file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

/// Holds an exclusive `flock` on a file for as long as it's alive. The OS
/// releases the lock when `file` is dropped (process exit included).
pub struct DaemonLock {
    file: std::fs::File,
    path: PathBuf,
}

impl DaemonLock {
    /// Acquire the lock at `path`, creating the file if needed. Fails
    /// immediately rather than blocking if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LockError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;

        file.try_lock_exclusive().map_err(|source| LockError::AlreadyLocked {
            path: path.to_path_buf(),
            source,
        })?;

        let mut file = file;
        file.set_len(0).map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        writeln!(file, "{}", std::process::id())
            .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;

        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DaemonLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
