// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL mutation events.
//!
//! Every state change passes through one of these variants before it is
//! applied to the materialized state (see `oj-storage::state`). IDs embedded
//! in events are allocated by the Store *before* the WAL append, so replay
//! never needs to re-derive them.

use crate::id::{PlanGroupId, TaskEventId, TaskId, WorkingCopyId};
use crate::task::TaskMode;
use crate::task_event::EventCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "task:created")]
    TaskCreated {
        id: TaskId,
        prompt: String,
        mode: TaskMode,
        priority: i64,
        cwd: Option<PathBuf>,
        plan_group_id: Option<PlanGroupId>,
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "task:started")]
    TaskStarted {
        id: TaskId,
        working_copy_id: Option<WorkingCopyId>,
        started_at: DateTime<Utc>,
    },

    #[serde(rename = "task:event_appended")]
    TaskEventAppended {
        task_id: TaskId,
        event_id: TaskEventId,
        category: EventCategory,
        payload: Value,
        ts: DateTime<Utc>,
    },

    #[serde(rename = "task:finished")]
    TaskFinished {
        id: TaskId,
        status: crate::task::TaskStatus,
        finished_at: DateTime<Utc>,
        result_text: Option<String>,
        cost: Option<f64>,
    },

    #[serde(rename = "task:cancelled")]
    TaskCancelled { id: TaskId, cancelled_at: DateTime<Utc> },

    /// Links a task to the plan group it belongs to. Split out from
    /// `task:created` so a planner task and its group can each be created
    /// with a real id for the other to reference, without a circular
    /// allocation.
    #[serde(rename = "task:plan_group_linked")]
    TaskPlanGroupLinked { id: TaskId, plan_group_id: PlanGroupId },

    #[serde(rename = "working_copy:created")]
    WorkingCopyCreated {
        id: WorkingCopyId,
        name: String,
        path: PathBuf,
        branch: String,
    },

    #[serde(rename = "working_copy:leased")]
    WorkingCopyLeased { id: WorkingCopyId, task_id: TaskId },

    #[serde(rename = "working_copy:released")]
    WorkingCopyReleased { id: WorkingCopyId },

    #[serde(rename = "working_copy:removed")]
    WorkingCopyRemoved { id: WorkingCopyId },

    #[serde(rename = "plan_group:created")]
    PlanGroupCreated {
        id: PlanGroupId,
        goal: String,
        planner_task_id: TaskId,
        created_at: DateTime<Utc>,
    },

    #[serde(rename = "plan_group:parsed")]
    PlanGroupParsed { id: PlanGroupId, plan_text: Value },

    #[serde(rename = "plan_group:updated")]
    PlanGroupUpdated { id: PlanGroupId, plan_text: Value },

    #[serde(rename = "plan_group:approved")]
    PlanGroupApproved {
        id: PlanGroupId,
        child_task_ids: Vec<TaskId>,
    },

    #[serde(rename = "plan_group:completed")]
    PlanGroupCompleted {
        id: PlanGroupId,
        finished_at: DateTime<Utc>,
    },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
