// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `AgentProcess`: the seam between the Runner and an actual agent child
//! process. Exists so tests substitute a scripted fake instead of spawning
//! a real binary.

pub mod claude;
pub mod fake;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentProcessError {
    #[error("failed to spawn agent process: {0}")]
    Spawn(String),
    #[error("failed to read agent process output: {0}")]
    Io(#[from] std::io::Error),
}

/// One line emitted by the running agent process, with its exit status
/// folded in when the stream ends.
pub enum AgentLine {
    /// A line of output, already known to be valid UTF-8. Parsing it into a
    /// JSON event is the Runner's job (§4.D), not this trait's.
    Line(String),
    /// The process has exited; no more lines follow.
    Exit { code: i32, stderr: String },
}

/// Spawns and streams output from one agent invocation.
///
/// Implementations are single-use: `spawn` is called once per task, and the
/// returned stream is drained to completion by the Runner.
#[async_trait]
pub trait AgentProcess: Send + Sync {
    /// Launch the process for `prompt` in `cwd` (falls back to the current
    /// directory when `None`, per the pool-size-0 boundary case).
    async fn spawn(
        &self,
        prompt: &str,
        cwd: Option<&PathBuf>,
    ) -> Result<Box<dyn AgentStream>, AgentProcessError>;
}

/// The running process's standard-output line stream, plus its terminal
/// exit. Implementations read lines one at a time so the Runner can persist
/// and publish each event as it arrives (§4.D step 4).
#[async_trait]
pub trait AgentStream: Send {
    async fn next_line(&mut self) -> Result<AgentLine, AgentProcessError>;
}
