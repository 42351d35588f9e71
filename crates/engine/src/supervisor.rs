// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor (§9 "global supervisor handle"): the one explicitly
//! constructed object a binary entry point holds. Owns the Store, the
//! Working-Copy Pool, the Event Bus, and the Scheduler, and exposes the
//! Task/Plan/Working-copy APIs of §6 as plain async methods.

use crate::event_bus::EventBus;
use crate::plan;
use crate::pool::WorkingCopyPool;
use crate::scheduler::{Scheduler, WorkerSlot};
use crate::SchedulerError;
use oj_adapters::{AgentProcess, ProgressRecorder};
use oj_core::{Clock, PlanGroup, Task, TaskEvent, TaskId, TaskMode, TaskStatus};
use oj_storage::Store;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Supervisor {
    store: Arc<Store>,
    pool: Arc<WorkingCopyPool>,
    bus: Arc<EventBus>,
    scheduler: Arc<Scheduler>,
    clock: Arc<dyn Clock>,
}

impl Supervisor {
    /// Open the store at `db_path`, bring up `pool_size` working-copy slots
    /// under `repo_root`, and wire them to a `worker_count`-slot Scheduler.
    #[allow(clippy::too_many_arguments)]
    pub async fn init(
        db_path: &std::path::Path,
        repo_root: PathBuf,
        branch_prefix: impl Into<String>,
        worktree_base: Option<PathBuf>,
        pool_size: usize,
        worker_count: usize,
        agent: Arc<dyn AgentProcess>,
        progress: Arc<dyn ProgressRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerError> {
        let store = Arc::new(Store::open(db_path)?);
        let pool = Arc::new(
            WorkingCopyPool::init(store.clone(), repo_root, branch_prefix, worktree_base, pool_size)
                .await?,
        );
        let bus = Arc::new(EventBus::new());
        let scheduler = Arc::new(Scheduler::new(
            store.clone(),
            pool.clone(),
            bus.clone(),
            agent,
            progress,
            clock.clone(),
            worker_count,
        ));

        Ok(Self { store, pool, bus, scheduler, clock })
    }

    /// Start the dispatch loop.
    pub fn start(&self) {
        self.scheduler.start();
    }

    /// Cooperatively stop the dispatch loop and await every in-flight task.
    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn worker_snapshot(&self) -> Vec<WorkerSlot> {
        self.scheduler.snapshot()
    }

    // ── Task API (§6) ────────────────────────────────────────────────────

    pub fn create_task(
        &self,
        prompt: impl Into<String>,
        priority: i64,
        mode: TaskMode,
        cwd: Option<PathBuf>,
    ) -> Result<TaskId, SchedulerError> {
        let id = self.store.create_task(prompt, mode, priority, cwd, None, self.clock.now())?;
        self.scheduler.notify();
        Ok(id)
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Vec<Task> {
        self.store.list_tasks(status)
    }

    pub fn get_task(&self, id: TaskId) -> Option<(Task, Vec<TaskEvent>)> {
        self.store.get_task_with_events(id)
    }

    pub fn cancel_task(&self, id: TaskId) -> Result<(), SchedulerError> {
        self.store.cancel_task(id, self.clock.now())?;
        self.scheduler.notify();
        Ok(())
    }

    // ── Plan API (§6 / §4.F) ─────────────────────────────────────────────

    pub fn create_plan(&self, goal: &str) -> Result<(oj_core::PlanGroupId, TaskId), SchedulerError> {
        let result = plan::create(&self.store, goal, self.clock.as_ref())?;
        self.scheduler.notify();
        Ok(result)
    }

    pub fn get_plan(&self, group_id: oj_core::PlanGroupId) -> Option<(PlanGroup, Vec<Task>)> {
        let group = self.store.get_plan_group(group_id)?;
        let children = self.store.child_tasks(group_id);
        Some((group, children))
    }

    pub fn update_plan(&self, group_id: oj_core::PlanGroupId, plan_text: Value) -> Result<(), SchedulerError> {
        plan::edit(&self.store, group_id, plan_text)?;
        Ok(())
    }

    pub fn approve_plan(
        &self,
        group_id: oj_core::PlanGroupId,
        cwd: Option<PathBuf>,
    ) -> Result<Vec<TaskId>, SchedulerError> {
        let child_ids = plan::approve(&self.store, group_id, cwd, self.clock.as_ref())?;
        self.scheduler.notify();
        Ok(child_ids)
    }

    // ── Working-copy API (§6) ────────────────────────────────────────────

    pub fn list_working_copies(&self) -> Vec<oj_core::WorkingCopy> {
        self.store.list_working_copies()
    }

    /// Tear down a working-copy slot. Callers must ensure no task currently
    /// holds it; the Store itself does not enforce that.
    pub async fn remove_working_copy(&self, id: oj_core::WorkingCopyId) -> Result<(), SchedulerError> {
        self.pool.remove(id).await?;
        Ok(())
    }

    /// Flush the WAL into a fresh snapshot. Called on shutdown so the next
    /// startup replays little to no WAL.
    pub fn checkpoint(&self) -> Result<(), oj_storage::StoreError> {
        self.store.checkpoint()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
