// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Runner (§4.D): owns one child process end-to-end — spawn, stream
//! classification, persistence, publication, and the terminal status
//! write. Receives `publish` as a function value rather than a bus
//! reference, so it stays testable against a recording stub (§9).

use crate::RunnerError;
use oj_adapters::{AgentLine, AgentProcess};
use oj_core::{Clock, EventCategory, TaskId, TaskStatus};
use oj_storage::Store;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Fixed per-1k-token cost formula applied when a `result` event omits
/// `cost_usd` (§4.D step 5).
fn cost_from_usage(payload: &Value) -> Option<f64> {
    if let Some(cost) = payload.get("cost_usd").and_then(Value::as_f64) {
        return Some(cost);
    }
    let usage = payload.get("usage")?;
    let input = usage.get("input_tokens").and_then(Value::as_f64)?;
    let output = usage.get("output_tokens").and_then(Value::as_f64)?;
    Some((input * 0.015 + output * 0.075) / 1000.0)
}

/// Parse one line of child output into (category, event). A line that
/// isn't valid JSON becomes a synthetic `raw` event rather than aborting
/// the stream (§4.D step 3).
fn classify_line(line: &str) -> (EventCategory, Value) {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => {
            let type_field = value.get("type").and_then(Value::as_str).unwrap_or("");
            (EventCategory::from_type_field(type_field), value)
        }
        Err(_) => (EventCategory::System, json!({"type": "raw", "text": line})),
    }
}

pub struct AgentRunner {
    store: Arc<Store>,
    agent: Arc<dyn AgentProcess>,
}

impl AgentRunner {
    pub fn new(store: Arc<Store>, agent: Arc<dyn AgentProcess>) -> Self {
        Self { store, agent }
    }

    /// Run `prompt` for `task_id` to completion. The task is assumed
    /// already marked `running` by the caller (the Scheduler, which knows
    /// the leased working copy — see §9 Open Question resolution in
    /// DESIGN.md). Spawn failures and mid-stream read failures are caught
    /// and written as a `failed` terminal status rather than propagated;
    /// only Store errors bubble to the caller.
    pub async fn run(
        &self,
        task_id: TaskId,
        prompt: &str,
        cwd: Option<PathBuf>,
        clock: &dyn Clock,
        publish: &(dyn Fn(EventCategory, Value) + Send + Sync),
    ) -> Result<(), RunnerError> {
        let mut stream = match self.agent.spawn(prompt, cwd.as_ref()).await {
            Ok(stream) => stream,
            Err(e) => {
                self.store
                    .finish_task(task_id, TaskStatus::Failed, Some(e.to_string()), None, clock.now())?;
                return Ok(());
            }
        };

        let mut result_text: Option<String> = None;
        let mut cost: Option<f64> = None;

        loop {
            match stream.next_line().await {
                Ok(AgentLine::Line(line)) => {
                    let (category, payload) = classify_line(&line);
                    if category == EventCategory::Result {
                        result_text = payload.get("result").and_then(Value::as_str).map(String::from);
                        cost = cost_from_usage(&payload);
                    }
                    self.store.append_task_event(task_id, category, payload.clone(), clock.now())?;
                    publish(category, payload);
                }
                Ok(AgentLine::Exit { code, stderr }) => {
                    let status = if code == 0 { TaskStatus::Completed } else { TaskStatus::Failed };
                    let final_text = if status == TaskStatus::Failed && result_text.is_none() {
                        Some(format!("Process exited with code {code}: {stderr}"))
                    } else {
                        result_text
                    };
                    self.store.finish_task(task_id, status, final_text, cost, clock.now())?;
                    return Ok(());
                }
                Err(e) => {
                    self.store
                        .finish_task(task_id, TaskStatus::Failed, Some(e.to_string()), None, clock.now())?;
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
