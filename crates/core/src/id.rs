// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic integer identifiers for the four entity types.
//!
//! Every entity in this system is identified by a process-wide monotonic
//! `u64`, allocated by the Store as part of a WAL append. `IdGen` is the
//! allocator abstraction so tests can seed a generator at an arbitrary
//! starting point.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Define a newtype ID wrapper around `u64`.
///
/// Generates `new()`, `get()`, `Display`, `From<u64>`, and the derives
/// needed to key a `HashMap`/`BTreeMap` or serialize in the WAL.
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

define_int_id! {
    /// Identifies a Task.
    pub struct TaskId;
}

define_int_id! {
    /// Identifies a TaskEvent. Unique per task, not globally — see [`IdGen`].
    pub struct TaskEventId;
}

define_int_id! {
    /// Identifies a WorkingCopy (pool slot).
    pub struct WorkingCopyId;
}

define_int_id! {
    /// Identifies a PlanGroup.
    pub struct PlanGroupId;
}

/// Allocates monotonically increasing `u64`s, starting at 1.
///
/// Shared via `Arc` so every caller observes the same sequence; cloning an
/// `IdGen` shares the counter rather than resetting it.
#[derive(Clone)]
pub struct IdGen {
    next: Arc<AtomicU64>,
}

impl IdGen {
    /// New generator whose first `next()` call returns 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// New generator whose first `next()` call returns `start`.
    ///
    /// Used by recovery to resume numbering after the highest id seen in
    /// the replayed WAL/snapshot.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
