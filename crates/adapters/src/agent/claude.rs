// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `AgentProcess`: spawns the configured agent binary directly and
//! streams its stdout line by line. No tmux session, no interactive
//! transcript — the agent binary is invoked non-interactively and its
//! NDJSON output is read straight off the pipe.

use super::{AgentLine, AgentProcess, AgentProcessError, AgentStream};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};

/// Default agent binary and flags, lifted from the reference runner:
/// `claude -p <prompt> --dangerously-skip-permissions --output-format
/// stream-json --verbose`. Overridable via `OJ_AGENT_BIN` so integration
/// tests can point at a stand-in binary without recompiling.
pub const DEFAULT_AGENT_BIN: &str = "claude";

const FIXED_ARGS: &[&str] = &[
    "--dangerously-skip-permissions",
    "--output-format",
    "stream-json",
    "--verbose",
];

pub struct ClaudeAgentProcess {
    bin: String,
}

impl ClaudeAgentProcess {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for ClaudeAgentProcess {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_BIN)
    }
}

#[async_trait]
impl AgentProcess for ClaudeAgentProcess {
    async fn spawn(
        &self,
        prompt: &str,
        cwd: Option<&PathBuf>,
    ) -> Result<Box<dyn AgentStream>, AgentProcessError> {
        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.arg("-p")
            .arg(prompt)
            .args(FIXED_ARGS)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| AgentProcessError::Spawn(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentProcessError::Spawn("child has no stdout pipe".into()))?;
        let lines = BufReader::new(stdout).lines();

        Ok(Box::new(ClaudeAgentStream {
            child,
            lines,
            exited: false,
        }))
    }
}

struct ClaudeAgentStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    exited: bool,
}

#[async_trait]
impl AgentStream for ClaudeAgentStream {
    async fn next_line(&mut self) -> Result<AgentLine, AgentProcessError> {
        if self.exited {
            return Ok(AgentLine::Exit { code: 0, stderr: String::new() });
        }

        if let Some(line) = self.lines.next_line().await? {
            return Ok(AgentLine::Line(line));
        }

        self.exited = true;
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr).await;
        }
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| AgentProcessError::Spawn(e.to_string()))?;
        Ok(AgentLine::Exit {
            code: status.code().unwrap_or(-1),
            stderr,
        })
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
