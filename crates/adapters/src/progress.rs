// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProgressRecorder`: the "auto-progress" side effect (§9). The Scheduler
//! calls this best-effort after a task completes; errors are swallowed by
//! the caller, and the engine holds no dependency on any real
//! implementation — only this trait.

use async_trait::async_trait;
use oj_core::TaskId;

#[async_trait]
pub trait ProgressRecorder: Send + Sync {
    async fn record_completion(&self, task_id: TaskId, result_text: Option<&str>);
}

/// Default recorder: does nothing. Used whenever no external progress
/// system is configured.
pub struct NoopProgressRecorder;

#[async_trait]
impl ProgressRecorder for NoopProgressRecorder {
    async fn record_completion(&self, _task_id: TaskId, _result_text: Option<&str>) {}
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
