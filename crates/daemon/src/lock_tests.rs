// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn acquires_lock_on_fresh_path() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("daemon.lock");
    let lock = DaemonLock::acquire(&lock_path).unwrap();
    assert_eq!(lock.path(), lock_path);
    assert!(lock_path.exists());
}

#[test]
fn second_acquisition_fails_while_first_is_held() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("daemon.lock");
    let _first = DaemonLock::acquire(&lock_path).unwrap();

    let second = DaemonLock::acquire(&lock_path);
    assert!(matches!(second, Err(LockError::AlreadyLocked { .. })));
}

#[test]
fn lock_is_released_on_drop() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("daemon.lock");
    {
        let _first = DaemonLock::acquire(&lock_path).unwrap();
    }
    let second = DaemonLock::acquire(&lock_path);
    assert!(second.is_ok());
}

#[test]
fn creates_parent_directory_if_missing() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("nested").join("daemon.lock");
    let lock = DaemonLock::acquire(&lock_path).unwrap();
    assert!(lock.path().exists());
}
