// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan Workflow (§4.F): turns a goal into a reviewable plan, then into a
//! set of ordered execute tasks once approved.

use crate::PlanError;
use oj_core::{
    Clock, EventCategory, ParsedPlan, PlanGroupId, PlanStep, TaskEvent, TaskId, TaskMode,
};
use oj_storage::Store;
use serde_json::Value;
use std::path::PathBuf;

fn planner_prompt(goal: &str) -> String {
    format!(
        "You are a planning architect. Break the following goal into an \
         ordered list of concrete steps, then respond with ONLY a JSON \
         object of the form {{\"summary\": <string>, \"steps\": \
         [{{\"title\": <string>, \"description\": <string>, \"prompt\": \
         <string executable by another agent>}}]}}.\n\nGoal: {goal}"
    )
}

/// Create a PlanGroup in `planning` and a single planner task
/// (`mode=plan`) linked to it. Returns (group_id, planner_task_id).
pub fn create(
    store: &Store,
    goal: &str,
    clock: &dyn Clock,
) -> Result<(PlanGroupId, TaskId), PlanError> {
    let now = clock.now();
    let planner_task_id = store.create_task(planner_prompt(goal), TaskMode::Plan, 0, None, None, now)?;
    let group_id = store.create_plan_group(goal, planner_task_id, now)?;
    store.link_task_to_plan_group(planner_task_id, group_id)?;
    Ok((group_id, planner_task_id))
}

fn latest_result_text(events: &[TaskEvent]) -> Option<String> {
    events
        .iter()
        .rev()
        .find(|e| e.category == EventCategory::Result)
        .and_then(|e| e.payload.get("result").and_then(Value::as_str))
        .map(String::from)
}

fn first_assistant_text_with_brace(events: &[TaskEvent]) -> Option<String> {
    events
        .iter()
        .filter(|e| e.category == EventCategory::Assistant)
        .filter_map(|e| e.payload.get("text").and_then(Value::as_str))
        .find(|text| text.contains('{'))
        .map(String::from)
}

fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim().to_string()
}

/// Try a full JSON parse, then the substring from the first `{` to the
/// last `}` (§4.F parse-on-complete).
fn parse_json_loose(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end]).ok()
}

/// Invoked by the Scheduler once the planner task finishes. Finds the plan
/// text (stored result, then latest `result` event, then the first
/// assistant event containing `{`), parses it loosely, and stores whatever
/// was found — a parse failure still reaches `reviewing` with the raw text
/// (§7: plan parse errors are surfaced, not retried).
pub fn parse_on_complete(store: &Store, planner_task_id: TaskId) -> Result<(), PlanError> {
    let (task, events) = store
        .get_task_with_events(planner_task_id)
        .ok_or(PlanError::TaskNotFound(planner_task_id))?;
    let group_id = task.plan_group_id.ok_or(PlanError::TaskNotFound(planner_task_id))?;

    let raw = task
        .result_text
        .clone()
        .or_else(|| latest_result_text(&events))
        .or_else(|| first_assistant_text_with_brace(&events))
        .unwrap_or_default();

    let cleaned = strip_fences(&raw);
    let plan_text = parse_json_loose(&cleaned).unwrap_or(Value::String(raw));

    store.parse_plan(group_id, plan_text)?;
    Ok(())
}

/// Replace the stored plan text while still `reviewing` (§4.F Edit).
pub fn edit(store: &Store, group_id: PlanGroupId, plan_text: Value) -> Result<(), PlanError> {
    store.update_plan(group_id, plan_text)?;
    Ok(())
}

/// Approve the group's current plan: materialize one execute task per
/// step, priorities strictly decreasing with step order, all tagged with
/// the group id. An unparseable plan (stored as a raw string rather than
/// an object with steps) still yields exactly one subtask, using the raw
/// text as its prompt (§8 boundary case).
pub fn approve(
    store: &Store,
    group_id: PlanGroupId,
    cwd: Option<PathBuf>,
    clock: &dyn Clock,
) -> Result<Vec<TaskId>, PlanError> {
    let group = store
        .get_plan_group(group_id)
        .ok_or(PlanError::NoPlanText(group_id))?;
    let plan_text = group.plan_text.ok_or(PlanError::NoPlanText(group_id))?;

    let parsed: ParsedPlan = serde_json::from_value(plan_text.clone())
        .unwrap_or_else(|_| ParsedPlan { summary: String::new(), steps: Vec::new() });
    let steps = if parsed.steps.is_empty() {
        let prompt = plan_text.as_str().map(String::from).unwrap_or(plan_text.to_string());
        vec![PlanStep {
            title: "plan".to_string(),
            description: String::new(),
            prompt,
        }]
    } else {
        parsed.steps
    };

    let total = steps.len() as i64;
    let mut child_ids = Vec::with_capacity(steps.len());
    for (i, step) in steps.into_iter().enumerate() {
        let priority = total - i as i64;
        let id = store.create_task(
            step.prompt,
            TaskMode::Execute,
            priority,
            cwd.clone(),
            Some(group_id),
            clock.now(),
        )?;
        child_ids.push(id);
    }

    store.approve_plan(group_id, child_ids.clone())?;
    Ok(child_ids)
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
