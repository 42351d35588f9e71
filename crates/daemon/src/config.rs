// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, loaded from the environment at startup.

use std::path::PathBuf;
use tracing::warn;

/// Default number of working-copy pool slots (§6 Configuration).
pub const DEFAULT_POOL_SIZE: usize = 4;
/// Default number of scheduler worker slots (§6 Configuration).
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
pub const DEFAULT_AGENT_BIN: &str = oj_adapters::DEFAULT_AGENT_BIN;
const DEFAULT_DB_DIR: &str = "oj-data";
const DEFAULT_BRANCH_PREFIX: &str = "oj";

#[derive(Debug, Clone)]
pub struct Config {
    /// Working-copy pool size (`OJ_POOL_SIZE`).
    pub pool_size: usize,
    /// Scheduler worker slot count (`OJ_MAX_CONCURRENT`).
    pub max_concurrent: usize,
    /// Store location (`OJ_DB_PATH`).
    pub db_path: PathBuf,
    /// Source tree the working-copy pool checks out from (`OJ_REPO_ROOT`).
    pub repo_root: PathBuf,
    /// Override for the checkout root, otherwise `<repo_root>/.oj` (`OJ_WORKTREE_BASE`).
    pub worktree_base: Option<PathBuf>,
    /// Agent binary name (`OJ_AGENT_BIN`).
    pub agent_bin: String,
}

fn parse_env_usize(var: &str, default: usize) -> usize {
    match std::env::var(var) {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                warn!(var, raw, "malformed environment variable, using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    /// Read configuration from the environment, falling back to documented
    /// defaults for anything unset or malformed. Never panics — a bad value
    /// is logged and the default used instead (§7 error handling).
    pub fn from_env() -> Self {
        let pool_size = parse_env_usize("OJ_POOL_SIZE", DEFAULT_POOL_SIZE);
        let max_concurrent = parse_env_usize("OJ_MAX_CONCURRENT", DEFAULT_MAX_CONCURRENT);
        let db_path = std::env::var("OJ_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join(DEFAULT_DB_DIR));
        let repo_root = std::env::var("OJ_REPO_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default());
        let worktree_base = std::env::var("OJ_WORKTREE_BASE").ok().map(PathBuf::from);
        let agent_bin = std::env::var("OJ_AGENT_BIN").unwrap_or_else(|_| DEFAULT_AGENT_BIN.to_string());

        let config = Self {
            pool_size,
            max_concurrent,
            db_path,
            repo_root,
            worktree_base,
            agent_bin,
        };
        tracing::info!(?config, "effective daemon configuration");
        config
    }

    pub fn branch_prefix(&self) -> &str {
        DEFAULT_BRANCH_PREFIX
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
