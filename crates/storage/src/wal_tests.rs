// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_core::test_support::{task_created_event, task_started_event};
use tempfile::tempdir;

#[test]
fn append_and_flush_then_read_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();

    let seq = wal.append(&task_created_event(1, "hello")).unwrap();
    assert_eq!(seq, 1);
    wal.flush().unwrap();

    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 1);
    assert_eq!(entry.event, task_created_event(1, "hello"));
}

#[test]
fn reopen_resumes_write_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&task_created_event(1, "a")).unwrap();
        wal.append(&task_started_event(1, None)).unwrap();
        wal.flush().unwrap();
    }

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 2);
}

#[test]
fn next_unprocessed_returns_none_when_caught_up() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&task_created_event(1, "a")).unwrap();
    wal.flush().unwrap();

    let entry = wal.next_unprocessed().unwrap().unwrap();
    wal.mark_processed(entry.seq);

    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn truncate_before_drops_processed_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&task_created_event(1, "a")).unwrap();
    wal.append(&task_created_event(2, "b")).unwrap();
    wal.append(&task_created_event(3, "c")).unwrap();
    wal.flush().unwrap();
    wal.mark_processed(2);

    wal.truncate_before(3).unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 3);
}

#[test]
fn entries_after_skips_already_seen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&task_created_event(1, "a")).unwrap();
    wal.append(&task_created_event(2, "b")).unwrap();
    wal.flush().unwrap();

    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 2);
}

#[test]
fn corrupt_trailing_line_is_skipped_without_failing_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&task_created_event(1, "a")).unwrap();
        wal.flush().unwrap();
    }
    use std::io::Write;
    let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(f, "{{not valid json").unwrap();

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 1);
    assert!(path.with_extension("bak").exists());
}
