// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PlanGroup: a user goal and the ordered subtasks its plan expands into.

use crate::id::PlanGroupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a [`PlanGroup`]. `Approved` is preserved in the enum but no
/// transition ever lands on it — the implementation goes straight from
/// `Reviewing` to `Executing` on approval (see §9 design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanGroupStatus {
    Planning,
    Reviewing,
    Approved,
    Executing,
    Completed,
}

impl std::fmt::Display for PlanGroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanGroupStatus::Planning => "planning",
            PlanGroupStatus::Reviewing => "reviewing",
            PlanGroupStatus::Approved => "approved",
            PlanGroupStatus::Executing => "executing",
            PlanGroupStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// A single parsed step of a plan, materialized into an execute Task on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub prompt: String,
}

/// The shape a well-formed planner response parses into. Anything else is
/// stored verbatim as raw text per §4.F.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPlan {
    #[serde(default)]
    pub summary: String,
    pub steps: Vec<PlanStep>,
}

/// A container for a user goal and the ordered subtasks its plan expands into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGroup {
    pub id: PlanGroupId,
    pub goal: String,
    /// JSON plan text once parsed, or the raw planner output verbatim if it
    /// did not parse. `None` until the planning task completes.
    pub plan_text: Option<Value>,
    pub status: PlanGroupStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PlanGroup {
    pub fn new(id: PlanGroupId, goal: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            goal: goal.into(),
            plan_text: None,
            status: PlanGroupStatus::Planning,
            created_at,
            finished_at: None,
        }
    }
}

#[cfg(test)]
#[path = "plan_group_tests.rs"]
mod tests;
