// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working-Copy Pool (§4.B): a fixed number of isolated on-disk checkouts,
//! each on its own reserved branch, leased to tasks for the duration of a
//! run.

use crate::PoolError;
use oj_adapters::git;
use oj_core::{TaskId, WorkingCopy, WorkingCopyId};
use oj_storage::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const HIDDEN_DIR: &str = ".oj";

pub struct WorkingCopyPool {
    store: Arc<Store>,
    repo_root: PathBuf,
    branch_prefix: String,
}

impl WorkingCopyPool {
    /// Ensure `size` slots exist under `repo_root`, creating branches and
    /// worktrees for any that are missing. Existing slots (already present
    /// in the Store) are left untouched — init is idempotent. A slot whose
    /// git setup fails is skipped and logged; the pool may end up smaller
    /// than requested.
    pub async fn init(
        store: Arc<Store>,
        repo_root: PathBuf,
        branch_prefix: impl Into<String>,
        worktree_base: Option<PathBuf>,
        size: usize,
    ) -> Result<Self, PoolError> {
        let branch_prefix = branch_prefix.into();
        let checkout_root = worktree_base.unwrap_or_else(|| repo_root.join(HIDDEN_DIR));
        let existing: std::collections::HashSet<String> = store
            .list_working_copies()
            .into_iter()
            .map(|wc| wc.name)
            .collect();

        for i in 0..size {
            let name = WorkingCopy::slot_name(i);
            if existing.contains(&name) {
                continue;
            }
            let branch = WorkingCopy::branch_name(&branch_prefix, i);
            let path = checkout_root.join(&name);

            let setup = async {
                git::ensure_branch(&repo_root, &branch).await?;
                git::ensure_worktree(&repo_root, &path, &branch).await
            };
            match setup.await {
                Ok(()) => {
                    store.create_working_copy(name.as_str(), path, branch.as_str())?;
                    info!(slot = %name, "working copy ready");
                }
                Err(e) => {
                    warn!(slot = %name, error = %e, "skipping working copy slot, setup failed");
                }
            }
        }

        Ok(Self {
            store,
            repo_root,
            branch_prefix,
        })
    }

    pub fn branch_prefix(&self) -> &str {
        &self.branch_prefix
    }

    /// Lease the lowest-id idle working copy to `task_id`, or `None` if the
    /// pool is fully busy (or empty — the size-0 boundary case).
    pub fn acquire(&self, task_id: TaskId) -> Result<Option<WorkingCopy>, PoolError> {
        Ok(self.store.acquire_working_copy(task_id)?)
    }

    /// Reset the checkout and flip it back to idle. Succeeds even if the
    /// git reset fails or the checkout is missing — liveness over
    /// cleanliness (§7).
    pub async fn release(&self, id: WorkingCopyId) -> Result<(), PoolError> {
        if let Some(wc) = self.store.get_working_copy(id) {
            if let Err(e) = git::reset_worktree(&wc.path).await {
                warn!(working_copy = %id, error = %e, "working copy reset failed, releasing anyway");
            }
        }
        self.store.release_working_copy(id)?;
        Ok(())
    }

    /// Tear down a slot permanently. Callers must ensure no task holds it.
    pub async fn remove(&self, id: WorkingCopyId) -> Result<(), PoolError> {
        if let Some(wc) = self.store.get_working_copy(id) {
            git::remove_worktree(&self.repo_root, &wc.path).await?;
        }
        self.store.remove_working_copy(id)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
