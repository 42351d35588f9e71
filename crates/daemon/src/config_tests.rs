// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    for var in [
        "OJ_POOL_SIZE",
        "OJ_MAX_CONCURRENT",
        "OJ_DB_PATH",
        "OJ_WORKTREE_BASE",
        "OJ_AGENT_BIN",
        "OJ_REPO_ROOT",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_when_unset() {
    clear_env();
    let config = Config::from_env();
    assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
    assert_eq!(config.agent_bin, DEFAULT_AGENT_BIN);
    assert!(config.worktree_base.is_none());
}

#[test]
#[serial]
fn malformed_numeric_value_falls_back_to_default() {
    clear_env();
    std::env::set_var("OJ_POOL_SIZE", "not-a-number");
    let config = Config::from_env();
    assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    clear_env();
}

#[test]
#[serial]
fn explicit_values_are_honored() {
    clear_env();
    std::env::set_var("OJ_POOL_SIZE", "7");
    std::env::set_var("OJ_MAX_CONCURRENT", "3");
    std::env::set_var("OJ_AGENT_BIN", "my-agent");
    std::env::set_var("OJ_WORKTREE_BASE", "/tmp/worktrees");
    let config = Config::from_env();
    assert_eq!(config.pool_size, 7);
    assert_eq!(config.max_concurrent, 3);
    assert_eq!(config.agent_bin, "my-agent");
    assert_eq!(config.worktree_base, Some(std::path::PathBuf::from("/tmp/worktrees")));
    clear_env();
}
