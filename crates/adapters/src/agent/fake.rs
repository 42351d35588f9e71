// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FakeAgentProcess`: replays a scripted NDJSON line list with a fixed
//! exit code. No real binary is ever spawned — this is the double used by
//! every Runner and Scheduler test (§8 ambient test tooling).

use super::{AgentLine, AgentProcess, AgentProcessError, AgentStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A canned agent run: the lines it emits on stdout, its exit code, and
/// anything it would have written to stderr.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRun {
    pub lines: Vec<String>,
    pub exit_code: i32,
    pub stderr: String,
    pub delay: Option<Duration>,
}

impl ScriptedRun {
    pub fn new(lines: Vec<String>, exit_code: i32) -> Self {
        Self {
            lines,
            exit_code,
            stderr: String::new(),
            delay: None,
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Sleep this long before the first line is emitted. Used by tests
    /// that need a window to observe the task in `running` before it
    /// completes (e.g. cancel-while-running).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Hands out one [`ScriptedRun`] per `spawn` call, in order. Records every
/// prompt/cwd it was spawned with so tests can assert on dispatch.
pub struct FakeAgentProcess {
    runs: Mutex<VecDeque<ScriptedRun>>,
    spawned_with: Arc<Mutex<Vec<(String, Option<PathBuf>)>>>,
}

impl FakeAgentProcess {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: Mutex::new(runs.into_iter().collect()),
            spawned_with: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience constructor for the common case of a single scripted run.
    pub fn single(run: ScriptedRun) -> Self {
        Self::new(vec![run])
    }

    pub fn spawned_with(&self) -> Vec<(String, Option<PathBuf>)> {
        self.spawned_with.lock().clone()
    }
}

#[async_trait]
impl AgentProcess for FakeAgentProcess {
    async fn spawn(
        &self,
        prompt: &str,
        cwd: Option<&PathBuf>,
    ) -> Result<Box<dyn AgentStream>, AgentProcessError> {
        self.spawned_with
            .lock()
            .push((prompt.to_string(), cwd.cloned()));

        let run = self
            .runs
            .lock()
            .pop_front()
            .ok_or_else(|| AgentProcessError::Spawn("no more scripted runs".into()))?;

        Ok(Box::new(FakeAgentStream {
            lines: run.lines.into_iter(),
            exit_code: run.exit_code,
            stderr: run.stderr,
            delay: run.delay,
            exited: false,
        }))
    }
}

struct FakeAgentStream {
    lines: std::vec::IntoIter<String>,
    exit_code: i32,
    stderr: String,
    delay: Option<Duration>,
    exited: bool,
}

#[async_trait]
impl AgentStream for FakeAgentStream {
    async fn next_line(&mut self) -> Result<AgentLine, AgentProcessError> {
        if let Some(delay) = self.delay.take() {
            tokio::time::sleep(delay).await;
        }
        if let Some(line) = self.lines.next() {
            return Ok(AgentLine::Line(line));
        }
        if !self.exited {
            self.exited = true;
            return Ok(AgentLine::Exit {
                code: self.exit_code,
                stderr: std::mem::take(&mut self.stderr),
            });
        }
        Ok(AgentLine::Exit { code: self.exit_code, stderr: String::new() })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
