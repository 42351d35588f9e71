// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler (§4.E): the dispatch loop. Owns a fixed number of worker
//! slots and alternates Reap (clear finished slots) and Fill (launch queued
//! tasks into idle slots), publishing a `scheduler_status` snapshot on the
//! Event Bus after every fill pass.

use crate::event_bus::{BusEvent, EventBus, SYSTEM_TASK_ID};
use crate::plan;
use crate::pool::WorkingCopyPool;
use crate::runner::AgentRunner;
use oj_adapters::{AgentProcess, ProgressRecorder};
use oj_core::{Clock, EventCategory, TaskId, TaskMode, TaskStatus, WorkingCopyId};
use oj_storage::Store;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Idle,
    Busy,
}

#[derive(Debug, Clone)]
pub struct WorkerSlot {
    pub status: SlotStatus,
    pub task_id: Option<TaskId>,
    pub prompt_preview: Option<String>,
    pub working_copy: Option<(WorkingCopyId, String)>,
}

impl WorkerSlot {
    fn idle() -> Self {
        Self {
            status: SlotStatus::Idle,
            task_id: None,
            prompt_preview: None,
            working_copy: None,
        }
    }
}

const PROMPT_PREVIEW_LEN: usize = 80;
const WAKEUP_CEILING: std::time::Duration = std::time::Duration::from_secs(5);

struct Worker {
    slot: WorkerSlot,
    handle: Option<JoinHandle<()>>,
}

/// Owns the dispatch loop. Cloning shares the same slots, store, pool, and
/// bus — `start`/`stop`/`notify` act on the one running loop.
pub struct Scheduler {
    store: Arc<Store>,
    pool: Arc<WorkingCopyPool>,
    bus: Arc<EventBus>,
    agent: Arc<dyn AgentProcess>,
    progress: Arc<dyn ProgressRecorder>,
    clock: Arc<dyn Clock>,
    workers: Arc<Mutex<Vec<Worker>>>,
    notify: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        store: Arc<Store>,
        pool: Arc<WorkingCopyPool>,
        bus: Arc<EventBus>,
        agent: Arc<dyn AgentProcess>,
        progress: Arc<dyn ProgressRecorder>,
        clock: Arc<dyn Clock>,
        worker_count: usize,
    ) -> Self {
        let workers = (0..worker_count)
            .map(|_| Worker { slot: WorkerSlot::idle(), handle: None })
            .collect();
        Self {
            store,
            pool,
            bus,
            agent,
            progress,
            clock,
            workers: Arc::new(Mutex::new(workers)),
            notify: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            loop_handle: Mutex::new(None),
        }
    }

    /// Wake the dispatch loop. Any of: a new task enqueued, a plan approved,
    /// a runner completed, or stop requested, must call this.
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    /// Read-only snapshot of every worker slot, in slot order.
    pub fn snapshot(&self) -> Vec<WorkerSlot> {
        self.workers.lock().iter().map(|w| w.slot.clone()).collect()
    }

    /// Start the dispatch loop as a background task. Calling this twice
    /// without an intervening `stop` leaks the first loop; callers own one
    /// Scheduler per running loop.
    pub fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.loop_handle.lock() = Some(handle);
    }

    /// Cooperatively stop: the dispatch loop exits at its next wakeup and
    /// every in-flight worker is awaited before returning. After this
    /// returns no slot is `busy`.
    pub async fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.notify();

        let loop_handle = self.loop_handle.lock().take();
        if let Some(handle) = loop_handle {
            let _ = handle.await;
        }

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock();
            workers.iter_mut().filter_map(|w| w.handle.take()).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn run_loop(self: Arc<Self>) {
        loop {
            self.reap();
            self.fill().await;

            self.publish_status();

            if self.stopping.load(Ordering::SeqCst) {
                return;
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(WAKEUP_CEILING) => {}
            }

            if self.stopping.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    fn reap(&self) {
        let mut workers = self.workers.lock();
        for worker in workers.iter_mut() {
            if worker.slot.status == SlotStatus::Busy {
                if let Some(handle) = &worker.handle {
                    if handle.is_finished() {
                        worker.handle = None;
                        worker.slot = WorkerSlot::idle();
                    }
                }
            }
        }
    }

    async fn fill(&self) {
        loop {
            let idle_index = {
                let workers = self.workers.lock();
                workers.iter().position(|w| w.slot.status == SlotStatus::Idle)
            };
            let Some(index) = idle_index else { return };

            let Some(task) = self.store.next_queued_task() else { return };

            let working_copy = match self.pool.acquire(task.id) {
                Ok(wc) => wc,
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "failed to acquire working copy");
                    None
                }
            };
            let cwd = working_copy.as_ref().map(|wc| wc.path.clone()).or_else(|| task.cwd.clone());
            let working_copy_id = working_copy.as_ref().map(|wc| wc.id);

            if let Err(e) = self.store.mark_task_running(task.id, working_copy_id, self.clock.now()) {
                error!(task_id = %task.id, error = %e, "failed to mark task running");
                if let Some(wc) = &working_copy {
                    let _ = self.pool.release(wc.id).await;
                }
                continue;
            }

            let preview: String = task.prompt.chars().take(PROMPT_PREVIEW_LEN).collect();
            let handle = self.spawn_worker(task.id, task.prompt.clone(), cwd);

            let mut workers = self.workers.lock();
            workers[index] = Worker {
                slot: WorkerSlot {
                    status: SlotStatus::Busy,
                    task_id: Some(task.id),
                    prompt_preview: Some(preview),
                    working_copy: working_copy.map(|wc| (wc.id, wc.name)),
                },
                handle: Some(handle),
            };
        }
    }

    fn spawn_worker(
        &self,
        task_id: TaskId,
        prompt: String,
        cwd: Option<std::path::PathBuf>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let pool = Arc::clone(&self.pool);
        let bus = Arc::clone(&self.bus);
        let agent = Arc::clone(&self.agent);
        let progress = Arc::clone(&self.progress);
        let clock = Arc::clone(&self.clock);
        let notify = Arc::clone(&self.notify);

        tokio::spawn(async move {
            let runner = AgentRunner::new(Arc::clone(&store), agent);
            let publish = {
                let bus = Arc::clone(&bus);
                move |category: EventCategory, payload: Value| {
                    bus.publish(BusEvent { task_id, category, payload });
                }
            };

            if let Err(e) = runner.run(task_id, &prompt, cwd, clock.as_ref(), &publish).await {
                error!(task_id = %task_id, error = %e, "agent runner returned a store error");
            }

            complete_task(&store, &pool, progress.as_ref(), clock.as_ref(), task_id).await;
            notify.notify_one();
        })
    }

    fn publish_status(&self) {
        let snapshot = self.snapshot();
        let workers: Vec<Value> = snapshot
            .iter()
            .map(|w| {
                json!({
                    "status": if w.status == SlotStatus::Busy { "busy" } else { "idle" },
                    "task_id": w.task_id.map(|id| id.get()),
                    "prompt_preview": w.prompt_preview,
                    "working_copy": w.working_copy.as_ref().map(|(_, name)| name.clone()),
                })
            })
            .collect();
        self.bus.publish(BusEvent {
            task_id: SYSTEM_TASK_ID,
            category: EventCategory::System,
            payload: json!({"type": "scheduler_status", "workers": workers}),
        });
    }
}

/// The completion hook (§4.E): plan-parse on a finished planner task, group
/// completion check, best-effort progress recording, and always releasing
/// the working copy.
async fn complete_task(
    store: &Arc<Store>,
    pool: &Arc<WorkingCopyPool>,
    progress: &dyn ProgressRecorder,
    clock: &dyn Clock,
    task_id: TaskId,
) {
    let Some(task) = store.get_task(task_id) else {
        warn!(task_id = %task_id, "completed task vanished before completion hook ran");
        return;
    };

    if task.mode == TaskMode::Plan {
        if let Err(e) = plan::parse_on_complete(store, task_id) {
            error!(task_id = %task_id, error = %e, "plan parse on completion failed");
        }
    }

    if let Some(group_id) = task.plan_group_id {
        if let Err(e) = store.check_plan_group_completion(group_id, clock.now()) {
            error!(task_id = %task_id, group_id = %group_id, error = %e, "plan group completion check failed");
        }
    }

    if task.status == TaskStatus::Completed {
        progress.record_completion(task_id, task.result_text.as_deref()).await;
    }

    if let Some(working_copy_id) = task.working_copy_id {
        if let Err(e) = pool.release(working_copy_id).await {
            error!(task_id = %task_id, working_copy_id = %working_copy_id, error = %e, "failed to release working copy");
        }
    }

    info!(task_id = %task_id, status = %task.status, "task completion hook finished");
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
