// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store: the single source of truth for tasks, event logs, working-copy
//! pool records, and plan groups (§4.A).
//!
//! Writes append to the WAL and apply to the materialized state behind one
//! lock, so every write is atomic and callers on the same process read their
//! own writes immediately. `checkpoint()` persists a snapshot and truncates
//! the WAL; it is not on the hot path and callers invoke it periodically or
//! at shutdown.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use oj_core::{
    Event, IdGen, PlanGroup, PlanGroupId, PlanGroupStatus, Task, TaskEvent, TaskEventId, TaskId,
    TaskMode, TaskStatus, WorkingCopy, WorkingCopyId, WorkingCopyStatus,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("working copy {0} not found")]
    WorkingCopyNotFound(WorkingCopyId),
    #[error("plan group {0} not found")]
    PlanGroupNotFound(PlanGroupId),
    #[error("task {0} is not cancellable from its current status")]
    NotCancellable(TaskId),
}

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

/// Durable persistence for the engine's entire domain state.
///
/// Cheap to clone: internally it is an `Arc`-free single struct guarded by
/// one lock, held by reference everywhere it's needed (Pool, Runner,
/// Scheduler, Plan Workflow all take `&Store`).
pub struct Store {
    inner: Mutex<Inner>,
    task_ids: IdGen,
    task_event_ids: IdGen,
    working_copy_ids: IdGen,
    plan_group_ids: IdGen,
    snapshot_path: PathBuf,
}

const SNAPSHOT_FILE: &str = "snapshot.json";
const WAL_FILE: &str = "wal.jsonl";

impl Store {
    /// Open (or create) a store rooted at `db_path`. Recovers by loading the
    /// newest snapshot, if any, then replaying WAL entries after it.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(db_path).map_err(WalError::from)?;
        let snapshot_path = db_path.join(SNAPSHOT_FILE);
        let wal_path = db_path.join(WAL_FILE);

        let snapshot = Snapshot::load(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        for entry in wal.entries_after(processed_seq)? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        let task_ids = IdGen::starting_at(state.max_task_id() + 1);
        let task_event_ids = IdGen::starting_at(state.max_task_event_id() + 1);
        let working_copy_ids = IdGen::starting_at(state.max_working_copy_id() + 1);
        let plan_group_ids = IdGen::starting_at(state.max_plan_group_id() + 1);

        Ok(Self {
            inner: Mutex::new(Inner { state, wal }),
            task_ids,
            task_event_ids,
            working_copy_ids,
            plan_group_ids,
            snapshot_path,
        })
    }

    fn append(inner: &mut Inner, event: Event) -> Result<(), StoreError> {
        let seq = inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        Ok(())
    }

    // ── Task operations ─────────────────────────────────────────────────

    pub fn create_task(
        &self,
        prompt: impl Into<String>,
        mode: TaskMode,
        priority: i64,
        cwd: Option<PathBuf>,
        plan_group_id: Option<PlanGroupId>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<TaskId, StoreError> {
        let id = TaskId::new(self.task_ids.next());
        let mut inner = self.inner.lock();
        Self::append(
            &mut inner,
            Event::TaskCreated {
                id,
                prompt: prompt.into(),
                mode,
                priority,
                cwd,
                plan_group_id,
                created_at: now,
            },
        )?;
        Ok(id)
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.inner.lock().state.tasks.get(&id).cloned()
    }

    pub fn get_task_with_events(&self, id: TaskId) -> Option<(Task, Vec<TaskEvent>)> {
        let inner = self.inner.lock();
        let task = inner.state.tasks.get(&id)?.clone();
        let events = inner.state.task_events.get(&id).cloned().unwrap_or_default();
        Some((task, events))
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Vec<Task> {
        let inner = self.inner.lock();
        inner
            .state
            .tasks
            .values()
            .filter(|t| status.map(|s| t.status == s).unwrap_or(true))
            .cloned()
            .collect()
    }

    /// Queued tasks ordered `priority DESC, id ASC` — the scheduler's pickup order (§4.E).
    pub fn next_queued_task(&self) -> Option<Task> {
        let inner = self.inner.lock();
        inner
            .state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Queued)
            .min_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)))
            .cloned()
    }

    pub fn mark_task_running(
        &self,
        id: TaskId,
        working_copy_id: Option<WorkingCopyId>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.tasks.contains_key(&id) {
            return Err(StoreError::TaskNotFound(id));
        }
        Self::append(
            &mut inner,
            Event::TaskStarted {
                id,
                working_copy_id,
                started_at: now,
            },
        )
    }

    pub fn append_task_event(
        &self,
        task_id: TaskId,
        category: oj_core::EventCategory,
        payload: Value,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<TaskEventId, StoreError> {
        let event_id = TaskEventId::new(self.task_event_ids.next());
        let mut inner = self.inner.lock();
        if !inner.state.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound(task_id));
        }
        Self::append(
            &mut inner,
            Event::TaskEventAppended {
                task_id,
                event_id,
                category,
                payload,
                ts: now,
            },
        )?;
        Ok(event_id)
    }

    /// Writes the task's terminal status. A no-op if the task is already
    /// `cancelled` — the runner's final write must never overwrite a
    /// cancellation (§5).
    pub fn finish_task(
        &self,
        id: TaskId,
        status: TaskStatus,
        result_text: Option<String>,
        cost: Option<f64>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let Some(task) = inner.state.tasks.get(&id) else {
            return Err(StoreError::TaskNotFound(id));
        };
        if task.status == TaskStatus::Cancelled {
            return Ok(());
        }
        Self::append(
            &mut inner,
            Event::TaskFinished {
                id,
                status,
                finished_at: now,
                result_text,
                cost,
            },
        )
    }

    /// Cancel permitted only from `queued|running` (§6 Task API).
    pub fn cancel_task(
        &self,
        id: TaskId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let Some(task) = inner.state.tasks.get(&id) else {
            return Err(StoreError::TaskNotFound(id));
        };
        if !task.is_cancellable() {
            return Err(StoreError::NotCancellable(id));
        }
        Self::append(&mut inner, Event::TaskCancelled { id, cancelled_at: now })
    }

    /// Record that `task_id` belongs to `group_id`. Used by the Plan
    /// Workflow to link a planner task and its group after both have been
    /// allocated real ids (they cannot reference each other at creation
    /// time without a circular dependency).
    pub fn link_task_to_plan_group(
        &self,
        task_id: TaskId,
        group_id: PlanGroupId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.tasks.contains_key(&task_id) {
            return Err(StoreError::TaskNotFound(task_id));
        }
        Self::append(
            &mut inner,
            Event::TaskPlanGroupLinked { id: task_id, plan_group_id: group_id },
        )
    }

    // ── Working-copy operations ─────────────────────────────────────────

    pub fn create_working_copy(
        &self,
        name: impl Into<String>,
        path: PathBuf,
        branch: impl Into<String>,
    ) -> Result<WorkingCopyId, StoreError> {
        let id = WorkingCopyId::new(self.working_copy_ids.next());
        let mut inner = self.inner.lock();
        Self::append(
            &mut inner,
            Event::WorkingCopyCreated {
                id,
                name: name.into(),
                path,
                branch: branch.into(),
            },
        )?;
        Ok(id)
    }

    pub fn list_working_copies(&self) -> Vec<WorkingCopy> {
        self.inner
            .lock()
            .state
            .working_copies
            .values()
            .filter(|wc| wc.status != WorkingCopyStatus::Removed)
            .cloned()
            .collect()
    }

    pub fn get_working_copy(&self, id: WorkingCopyId) -> Option<WorkingCopy> {
        self.inner.lock().state.working_copies.get(&id).cloned()
    }

    /// Lowest-id idle slot, flipped to `busy` atomically (§4.B Acquire).
    pub fn acquire_working_copy(&self, task_id: TaskId) -> Result<Option<WorkingCopy>, StoreError> {
        let mut inner = self.inner.lock();
        let candidate = inner
            .state
            .working_copies
            .values()
            .filter(|wc| wc.status == WorkingCopyStatus::Idle)
            .min_by_key(|wc| wc.id)
            .map(|wc| wc.id);
        let Some(id) = candidate else {
            return Ok(None);
        };
        Self::append(&mut inner, Event::WorkingCopyLeased { id, task_id })?;
        Ok(inner.state.working_copies.get(&id).cloned())
    }

    pub fn release_working_copy(&self, id: WorkingCopyId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::append(&mut inner, Event::WorkingCopyReleased { id })
    }

    pub fn remove_working_copy(&self, id: WorkingCopyId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.working_copies.contains_key(&id) {
            return Err(StoreError::WorkingCopyNotFound(id));
        }
        Self::append(&mut inner, Event::WorkingCopyRemoved { id })
    }

    // ── Plan-group operations ───────────────────────────────────────────

    pub fn create_plan_group(
        &self,
        goal: impl Into<String>,
        planner_task_id: TaskId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<PlanGroupId, StoreError> {
        let id = PlanGroupId::new(self.plan_group_ids.next());
        let mut inner = self.inner.lock();
        Self::append(
            &mut inner,
            Event::PlanGroupCreated {
                id,
                goal: goal.into(),
                planner_task_id,
                created_at: now,
            },
        )?;
        Ok(id)
    }

    pub fn get_plan_group(&self, id: PlanGroupId) -> Option<PlanGroup> {
        self.inner.lock().state.plan_groups.get(&id).cloned()
    }

    pub fn child_tasks(&self, group: PlanGroupId) -> Vec<Task> {
        self.inner
            .lock()
            .state
            .tasks
            .values()
            .filter(|t| t.plan_group_id == Some(group))
            .cloned()
            .collect()
    }

    pub fn parse_plan(&self, id: PlanGroupId, plan_text: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.plan_groups.contains_key(&id) {
            return Err(StoreError::PlanGroupNotFound(id));
        }
        Self::append(&mut inner, Event::PlanGroupParsed { id, plan_text })
    }

    /// Only permitted while `status=reviewing` (§4.F Edit).
    pub fn update_plan(&self, id: PlanGroupId, plan_text: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let Some(group) = inner.state.plan_groups.get(&id) else {
            return Err(StoreError::PlanGroupNotFound(id));
        };
        if group.status != PlanGroupStatus::Reviewing {
            return Err(StoreError::PlanGroupNotFound(id));
        }
        Self::append(&mut inner, Event::PlanGroupUpdated { id, plan_text })
    }

    pub fn approve_plan(&self, id: PlanGroupId, child_task_ids: Vec<TaskId>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.plan_groups.contains_key(&id) {
            return Err(StoreError::PlanGroupNotFound(id));
        }
        Self::append(&mut inner, Event::PlanGroupApproved { id, child_task_ids })
    }

    /// Re-checks completion and writes `status=completed` if every
    /// `mode=execute` child is terminal. Safe to call repeatedly (§4.F).
    pub fn check_plan_group_completion(
        &self,
        id: PlanGroupId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let Some(group) = inner.state.plan_groups.get(&id) else {
            return Err(StoreError::PlanGroupNotFound(id));
        };
        if group.status == PlanGroupStatus::Completed {
            return Ok(false);
        }
        // No execute children yet (plan not approved) must not read as
        // vacuously complete — see SPEC_FULL.md §8's "with at least one
        // child task" qualifier.
        if inner.state.execute_children(id).is_empty() {
            return Ok(false);
        }
        if !inner.state.unfinished_children(id).is_empty() {
            return Ok(false);
        }
        Self::append(&mut inner, Event::PlanGroupCompleted { id, finished_at: now })?;
        Ok(true)
    }

    // ── Durability maintenance ──────────────────────────────────────────

    /// Persist a snapshot of the current state and truncate the WAL before
    /// it. Not on any request's hot path; call periodically or at shutdown.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.wal.flush()?;
        let seq = inner.wal.processed_seq();
        let snapshot = Snapshot::new(seq, inner.state.clone());
        snapshot.save(&self.snapshot_path)?;
        inner.wal.truncate_before(seq)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
