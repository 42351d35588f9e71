// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskEvent: one line of a child process's event stream, persisted.

use crate::id::{TaskEventId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of a single line from the agent's output stream.
/// Unknown `type` fields map to `System`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Assistant,
    ToolUse,
    ToolResult,
    Result,
    Error,
    System,
}

impl EventCategory {
    /// Classify by the `type` field of a parsed agent stream line.
    pub fn from_type_field(type_field: &str) -> Self {
        match type_field {
            "assistant" => EventCategory::Assistant,
            "tool_use" => EventCategory::ToolUse,
            "tool_result" => EventCategory::ToolResult,
            "result" => EventCategory::Result,
            "error" => EventCategory::Error,
            _ => EventCategory::System,
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventCategory::Assistant => "assistant",
            EventCategory::ToolUse => "tool_use",
            EventCategory::ToolResult => "tool_result",
            EventCategory::Result => "result",
            EventCategory::Error => "error",
            EventCategory::System => "system",
        };
        write!(f, "{s}")
    }
}

/// An append-only log entry for one task. `id` is a per-task monotonic
/// counter — insertion order is the authoritative replay order (§3, §8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub id: TaskEventId,
    pub task_id: TaskId,
    pub category: EventCategory,
    pub payload: Value,
    pub ts: DateTime<Utc>,
}

impl TaskEvent {
    pub fn new(
        id: TaskEventId,
        task_id: TaskId,
        category: EventCategory,
        payload: Value,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            category,
            payload,
            ts,
        }
    }
}

#[cfg(test)]
#[path = "task_event_tests.rs"]
mod tests;
