// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Odd Jobs execution engine: the Working-Copy Pool, Agent Runner, Event
//! Bus, Scheduler dispatch loop, and Plan Workflow that together turn
//! queued tasks into running agent processes and back.

mod error;
mod event_bus;
pub mod plan;
mod pool;
mod runner;
mod scheduler;
mod supervisor;

pub use error::{PlanError, PoolError, RunnerError, SchedulerError};
pub use event_bus::{BusEvent, BusReceiver, EventBus, SYSTEM_TASK_ID};
pub use pool::WorkingCopyPool;
pub use runner::AgentRunner;
pub use scheduler::{Scheduler, SlotStatus, WorkerSlot};
pub use supervisor::Supervisor;
