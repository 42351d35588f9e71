// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task: one user-submitted unit of work executed by an agent process.

use crate::id::{PlanGroupId, TaskId, WorkingCopyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Status of a [`Task`]. Transitions are one-way except `queued -> running`
/// which the scheduler performs; terminal states never change once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Whether a task is a planning task (produces a plan for review) or an
/// ordinary executable task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    Execute,
    Plan,
}

/// A single unit of work handed to an agent child process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub prompt: String,
    pub status: TaskStatus,
    pub mode: TaskMode,
    pub priority: i64,
    pub working_copy_id: Option<WorkingCopyId>,
    pub plan_group_id: Option<PlanGroupId>,
    pub cwd: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result_text: Option<String>,
    pub cost: Option<f64>,
}

impl Task {
    /// Construct a freshly queued task. Callers supply the id (allocated by
    /// the Store) and the creation timestamp (supplied by the Clock).
    pub fn new(
        id: TaskId,
        prompt: impl Into<String>,
        mode: TaskMode,
        priority: i64,
        cwd: Option<PathBuf>,
        plan_group_id: Option<PlanGroupId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            status: TaskStatus::Queued,
            mode,
            priority,
            working_copy_id: None,
            plan_group_id,
            cwd,
            created_at,
            started_at: None,
            finished_at: None,
            result_text: None,
            cost: None,
        }
    }

    /// Whether this task may transition to `cancelled` right now.
    pub fn is_cancellable(&self) -> bool {
        matches!(self.status, TaskStatus::Queued | TaskStatus::Running)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
