// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Bus (§4.C): a process-wide in-memory fan-out, separate from the
//! Store's durable log. Delivery is best-effort and lossy — a slow or dead
//! subscriber is evicted rather than allowed to block the publisher; the
//! Store remains the canonical history.

use oj_core::{EventCategory, TaskId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Reserved task id carrying bus-level events that aren't about any one
/// task (e.g. `scheduler_status`, §4.E).
pub const SYSTEM_TASK_ID: TaskId = TaskId::new(0);

/// Bounded per-subscriber buffer. A subscriber that falls this far behind
/// has its oldest events dropped rather than stalling the publisher.
const SUBSCRIBER_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct BusEvent {
    pub task_id: TaskId,
    pub category: EventCategory,
    pub payload: Value,
}

pub type BusReceiver = mpsc::Receiver<BusEvent>;

#[derive(Default)]
pub struct EventBus {
    task_subscribers: Mutex<HashMap<TaskId, Vec<mpsc::Sender<BusEvent>>>>,
    global_subscribers: Mutex<Vec<mpsc::Sender<BusEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event published for `task_id`.
    pub fn subscribe_task(&self, task_id: TaskId) -> BusReceiver {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.task_subscribers.lock().entry(task_id).or_default().push(tx);
        rx
    }

    /// Subscribe to every event published on the bus, regardless of task.
    pub fn subscribe_global(&self) -> BusReceiver {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.global_subscribers.lock().push(tx);
        rx
    }

    /// Deliver to all task subscribers for `event.task_id` and all global
    /// subscribers. A subscriber whose channel is closed or full is dropped
    /// silently; the rest still receive the event.
    pub fn publish(&self, event: BusEvent) {
        let mut task_subs = self.task_subscribers.lock();
        if let Some(list) = task_subs.get_mut(&event.task_id) {
            list.retain(|tx| tx.try_send(event.clone()).is_ok());
            if list.is_empty() {
                task_subs.remove(&event.task_id);
            }
        }
        drop(task_subs);

        let mut global_subs = self.global_subscribers.lock();
        global_subs.retain(|tx| tx.try_send(event.clone()).is_ok());
    }

    /// Current number of live subscribers for `task_id`, for tests and
    /// diagnostics.
    pub fn task_subscriber_count(&self, task_id: TaskId) -> usize {
        self.task_subscribers
            .lock()
            .get(&task_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
