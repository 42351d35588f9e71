// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state: the in-memory projection rebuilt by replaying the WAL
//! (or loaded from a snapshot and replaying only what follows it).
//!
//! `apply_event` is the single place where an [`Event`] turns into a state
//! change; it must be safe to call repeatedly during replay and is never
//! expected to fail — a malformed event here is a programming error, not a
//! runtime condition to recover from.

use indexmap::IndexMap;
use oj_core::{
    Event, PlanGroup, PlanGroupId, PlanGroupStatus, Task, TaskEvent, TaskId, TaskMode, TaskStatus,
    WorkingCopy, WorkingCopyId, WorkingCopyStatus,
};
use serde::{Deserialize, Serialize};

/// The complete durable state of the engine: tasks, their event logs,
/// working-copy pool slots, and plan groups. One instance lives behind the
/// Store's lock; snapshots serialize it wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    pub tasks: IndexMap<TaskId, Task>,
    pub task_events: IndexMap<TaskId, Vec<TaskEvent>>,
    pub working_copies: IndexMap<WorkingCopyId, WorkingCopy>,
    pub plan_groups: IndexMap<PlanGroupId, PlanGroup>,
}

impl MaterializedState {
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::TaskCreated {
                id,
                prompt,
                mode,
                priority,
                cwd,
                plan_group_id,
                created_at,
            } => {
                let task = Task::new(
                    *id,
                    prompt.clone(),
                    *mode,
                    *priority,
                    cwd.clone(),
                    *plan_group_id,
                    *created_at,
                );
                self.tasks.insert(*id, task);
                self.task_events.entry(*id).or_default();
            }

            Event::TaskStarted {
                id,
                working_copy_id,
                started_at,
            } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Running;
                    task.working_copy_id = *working_copy_id;
                    task.started_at = Some(*started_at);
                }
            }

            Event::TaskEventAppended {
                task_id,
                event_id,
                category,
                payload,
                ts,
            } => {
                let entry = TaskEvent::new(*event_id, *task_id, *category, payload.clone(), *ts);
                self.task_events.entry(*task_id).or_default().push(entry);
            }

            Event::TaskFinished {
                id,
                status,
                finished_at,
                result_text,
                cost,
            } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    // A task already cancelled must never be overwritten by
                    // the runner's terminal write (§5 cancellation rules).
                    if task.status == TaskStatus::Cancelled {
                        return;
                    }
                    task.status = *status;
                    task.finished_at = Some(*finished_at);
                    task.result_text = result_text.clone();
                    task.cost = *cost;
                }
            }

            Event::TaskCancelled { id, cancelled_at } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.status = TaskStatus::Cancelled;
                    task.finished_at = Some(*cancelled_at);
                }
            }

            Event::TaskPlanGroupLinked { id, plan_group_id } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.plan_group_id = Some(*plan_group_id);
                }
            }

            Event::WorkingCopyCreated {
                id,
                name,
                path,
                branch,
            } => {
                let wc = WorkingCopy::new(*id, name.clone(), path.clone(), branch.clone());
                self.working_copies.insert(*id, wc);
            }

            Event::WorkingCopyLeased { id, task_id: _ } => {
                if let Some(wc) = self.working_copies.get_mut(id) {
                    wc.status = WorkingCopyStatus::Busy;
                }
            }

            Event::WorkingCopyReleased { id } => {
                if let Some(wc) = self.working_copies.get_mut(id) {
                    wc.status = WorkingCopyStatus::Idle;
                }
            }

            Event::WorkingCopyRemoved { id } => {
                if let Some(wc) = self.working_copies.get_mut(id) {
                    wc.status = WorkingCopyStatus::Removed;
                }
            }

            Event::PlanGroupCreated {
                id,
                goal,
                planner_task_id: _,
                created_at,
            } => {
                let group = PlanGroup::new(*id, goal.clone(), *created_at);
                self.plan_groups.insert(*id, group);
            }

            Event::PlanGroupParsed { id, plan_text } => {
                if let Some(group) = self.plan_groups.get_mut(id) {
                    group.plan_text = Some(plan_text.clone());
                    group.status = PlanGroupStatus::Reviewing;
                }
            }

            Event::PlanGroupUpdated { id, plan_text } => {
                if let Some(group) = self.plan_groups.get_mut(id) {
                    group.plan_text = Some(plan_text.clone());
                }
            }

            Event::PlanGroupApproved {
                id,
                child_task_ids: _,
            } => {
                if let Some(group) = self.plan_groups.get_mut(id) {
                    group.status = PlanGroupStatus::Executing;
                }
            }

            Event::PlanGroupCompleted { id, finished_at } => {
                if let Some(group) = self.plan_groups.get_mut(id) {
                    group.status = PlanGroupStatus::Completed;
                    group.finished_at = Some(*finished_at);
                }
            }
        }
    }

    /// Highest task id seen, for resuming the TaskId allocator after recovery.
    pub fn max_task_id(&self) -> u64 {
        self.tasks.keys().map(|id| id.get()).max().unwrap_or(0)
    }

    /// Highest working-copy id seen, for resuming that allocator.
    pub fn max_working_copy_id(&self) -> u64 {
        self.working_copies
            .keys()
            .map(|id| id.get())
            .max()
            .unwrap_or(0)
    }

    /// Highest plan-group id seen, for resuming that allocator.
    pub fn max_plan_group_id(&self) -> u64 {
        self.plan_groups
            .keys()
            .map(|id| id.get())
            .max()
            .unwrap_or(0)
    }

    /// Highest per-task event id seen across all tasks, for resuming that allocator.
    pub fn max_task_event_id(&self) -> u64 {
        self.task_events
            .values()
            .flat_map(|events| events.iter())
            .map(|e| e.id.get())
            .max()
            .unwrap_or(0)
    }

    /// `mode=execute` children of `group` that are not yet terminal.
    pub fn unfinished_children(&self, group: PlanGroupId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.plan_group_id == Some(group) && t.mode == TaskMode::Execute)
            .filter(|t| !t.status.is_terminal())
            .map(|t| t.id)
            .collect()
    }

    /// All `mode=execute` children of `group`, terminal or not. Empty before
    /// a plan has been approved — callers must not treat that as completion.
    pub fn execute_children(&self, group: PlanGroupId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.plan_group_id == Some(group) && t.mode == TaskMode::Execute)
            .map(|t| t.id)
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
