// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WorkingCopy: one pool slot — an isolated on-disk checkout on a reserved branch.

use crate::id::WorkingCopyId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lease state of a [`WorkingCopy`]. `Removed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingCopyStatus {
    Idle,
    Busy,
    Removed,
}

impl std::fmt::Display for WorkingCopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkingCopyStatus::Idle => "idle",
            WorkingCopyStatus::Busy => "busy",
            WorkingCopyStatus::Removed => "removed",
        };
        write!(f, "{s}")
    }
}

/// One slot of the working-copy pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCopy {
    pub id: WorkingCopyId,
    pub name: String,
    pub path: PathBuf,
    pub branch: String,
    pub status: WorkingCopyStatus,
}

impl WorkingCopy {
    pub fn new(id: WorkingCopyId, name: impl Into<String>, path: PathBuf, branch: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            path,
            branch: branch.into(),
            status: WorkingCopyStatus::Idle,
        }
    }

    /// Slot name for index `i`, e.g. `wt-03`.
    pub fn slot_name(i: usize) -> String {
        format!("wt-{i:02}")
    }

    /// Branch name for index `i` under the given prefix, e.g. `oj/wt-03`.
    pub fn branch_name(prefix: &str, i: usize) -> String {
        format!("{prefix}/{}", Self::slot_name(i))
    }
}

#[cfg(test)]
#[path = "working_copy_tests.rs"]
mod tests;
