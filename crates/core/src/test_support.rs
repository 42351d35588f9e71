// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test builders for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::Event;
use crate::id::{PlanGroupId, TaskEventId, TaskId, WorkingCopyId};
use crate::task::TaskMode;
use crate::task_event::EventCategory;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_000_000, 0).expect("valid fixed timestamp")
}

pub fn task_created_event(id: u64, prompt: &str) -> Event {
    Event::TaskCreated {
        id: TaskId::new(id),
        prompt: prompt.to_string(),
        mode: TaskMode::Execute,
        priority: 0,
        cwd: None,
        plan_group_id: None,
        created_at: epoch(),
    }
}

pub fn task_started_event(id: u64, working_copy_id: Option<u64>) -> Event {
    Event::TaskStarted {
        id: TaskId::new(id),
        working_copy_id: working_copy_id.map(WorkingCopyId::new),
        started_at: epoch(),
    }
}

pub fn task_event_appended_event(task_id: u64, event_id: u64, payload: Value) -> Event {
    Event::TaskEventAppended {
        task_id: TaskId::new(task_id),
        event_id: TaskEventId::new(event_id),
        category: EventCategory::Assistant,
        payload,
        ts: epoch(),
    }
}

pub fn task_finished_event(id: u64, status: crate::task::TaskStatus) -> Event {
    Event::TaskFinished {
        id: TaskId::new(id),
        status,
        finished_at: epoch(),
        result_text: Some("done".to_string()),
        cost: Some(0.0),
    }
}

pub fn working_copy_created_event(id: u64, name: &str) -> Event {
    Event::WorkingCopyCreated {
        id: WorkingCopyId::new(id),
        name: name.to_string(),
        path: std::path::PathBuf::from(format!("/test/{name}")),
        branch: format!("oj/{name}"),
    }
}

pub fn plan_group_created_event(id: u64, goal: &str, planner_task_id: u64) -> Event {
    Event::PlanGroupCreated {
        id: PlanGroupId::new(id),
        goal: goal.to_string(),
        planner_task_id: TaskId::new(planner_task_id),
        created_at: epoch(),
    }
}

pub fn plan_group_parsed_event(id: u64) -> Event {
    Event::PlanGroupParsed {
        id: PlanGroupId::new(id),
        plan_text: json!({"summary": "s", "steps": []}),
    }
}
