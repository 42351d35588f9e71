// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the agent child process, git working-copy
//! operations, and the auto-progress hook.

pub mod agent;
pub mod git;
pub mod progress;
pub mod subprocess;

pub use agent::claude::{ClaudeAgentProcess, DEFAULT_AGENT_BIN};
pub use agent::{AgentLine, AgentProcess, AgentProcessError, AgentStream};
pub use progress::{NoopProgressRecorder, ProgressRecorder};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use agent::fake::{FakeAgentProcess, ScriptedRun};
