// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git operations backing the Working-Copy Pool (§4.B): branch creation,
//! worktree add/remove, and the reset sequence run on release. Everything
//! shells out to the system `git` binary with a bounded timeout.

use crate::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("{0}")]
    CommandFailed(String),
}

fn git(repo_root: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(repo_root);
    cmd
}

async fn run(cmd: Command, description: &str) -> Result<(), GitError> {
    let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, description)
        .await
        .map_err(GitError::CommandFailed)?;
    if !output.status.success() {
        return Err(GitError::CommandFailed(format!(
            "{description}: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}

/// Ensure `branch` exists in `repo_root`, creating it off the current HEAD
/// if it doesn't. Idempotent.
pub async fn ensure_branch(repo_root: &Path, branch: &str) -> Result<(), GitError> {
    let mut check = git(repo_root);
    check.args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")]);
    let output = run_with_timeout(check, GIT_WORKTREE_TIMEOUT, "git show-ref")
        .await
        .map_err(GitError::CommandFailed)?;
    if output.status.success() {
        return Ok(());
    }

    let mut create = git(repo_root);
    create.args(["branch", branch]);
    run(create, "git branch").await
}

/// Ensure a worktree checkout of `branch` exists at `path`. Idempotent: if
/// `path` already looks like a worktree, this is a no-op.
pub async fn ensure_worktree(repo_root: &Path, path: &Path, branch: &str) -> Result<(), GitError> {
    if path.join(".git").exists() {
        return Ok(());
    }
    let mut cmd = git(repo_root);
    cmd.args(["worktree", "add", &path.to_string_lossy(), branch]);
    run(cmd, "git worktree add").await
}

/// Discard tracked modifications and remove untracked files in a checkout
/// (the release-time reset sequence, §4.B). Must succeed even against a
/// checkout that's in a dirty or partially-removed state.
pub async fn reset_worktree(path: &Path) -> Result<(), GitError> {
    let mut reset = Command::new("git");
    reset.current_dir(path).args(["reset", "--hard"]);
    run(reset, "git reset --hard").await?;

    let mut clean = Command::new("git");
    clean.current_dir(path).args(["clean", "-fd"]);
    run(clean, "git clean -fd").await
}

/// Tear down a worktree: `git worktree remove --force`, falling back to a
/// plain directory removal if git doesn't recognize it as a worktree.
pub async fn remove_worktree(repo_root: &Path, path: &Path) -> Result<(), GitError> {
    let mut cmd = git(repo_root);
    cmd.args(["worktree", "remove", "--force", &path.to_string_lossy()]);
    if run(cmd, "git worktree remove").await.is_ok() {
        return Ok(());
    }
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| GitError::CommandFailed(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
