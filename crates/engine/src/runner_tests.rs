// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_adapters::{FakeAgentProcess, ScriptedRun};
use oj_core::{FakeClock, TaskMode};
use std::sync::Mutex as StdMutex;
use tempfile::tempdir;

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(1_000_000, 0).unwrap()
}

fn store_with_running_task(dir: &std::path::Path) -> (Arc<Store>, TaskId) {
    let store = Arc::new(Store::open(dir).unwrap());
    let id = store
        .create_task("do it", TaskMode::Execute, 0, None, None, epoch())
        .unwrap();
    store.mark_task_running(id, None, epoch()).unwrap();
    (store, id)
}

#[tokio::test]
async fn completed_run_persists_events_and_cost() {
    let dir = tempdir().unwrap();
    let (store, task_id) = store_with_running_task(dir.path());

    let agent = Arc::new(FakeAgentProcess::single(ScriptedRun::new(
        vec![
            r#"{"type":"assistant","text":"a"}"#.into(),
            r#"{"type":"assistant","text":"b"}"#.into(),
            r#"{"type":"assistant","text":"c"}"#.into(),
            r#"{"type":"result","result":"done","cost_usd":0.12}"#.into(),
        ],
        0,
    )));
    let runner = AgentRunner::new(store.clone(), agent);
    let clock = FakeClock::new(epoch());
    let published = StdMutex::new(Vec::new());

    runner
        .run(task_id, "do it", None, &clock, &|cat, payload| {
            published.lock().unwrap().push((cat, payload));
        })
        .await
        .unwrap();

    let (task, events) = store.get_task_with_events(task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.cost, Some(0.12));
    assert_eq!(events.len(), 4);
    assert_eq!(published.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn cost_falls_back_to_usage_formula_when_cost_usd_absent() {
    let dir = tempdir().unwrap();
    let (store, task_id) = store_with_running_task(dir.path());

    let agent = Arc::new(FakeAgentProcess::single(ScriptedRun::new(
        vec![r#"{"type":"result","result":"done","usage":{"input_tokens":1000,"output_tokens":1000}}"#.into()],
        0,
    )));
    let runner = AgentRunner::new(store.clone(), agent);
    let clock = FakeClock::new(epoch());

    runner.run(task_id, "do it", None, &clock, &|_, _| {}).await.unwrap();

    let task = store.get_task(task_id).unwrap();
    assert_eq!(task.cost, Some(0.015 + 0.075));
}

#[tokio::test]
async fn nonzero_exit_without_result_fails_with_stderr() {
    let dir = tempdir().unwrap();
    let (store, task_id) = store_with_running_task(dir.path());

    let agent = Arc::new(FakeAgentProcess::single(
        ScriptedRun::new(vec![], 2).with_stderr("boom"),
    ));
    let runner = AgentRunner::new(store.clone(), agent);
    let clock = FakeClock::new(epoch());

    runner.run(task_id, "do it", None, &clock, &|_, _| {}).await.unwrap();

    let task = store.get_task(task_id).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.result_text, Some("Process exited with code 2: boom".to_string()));
}

#[tokio::test]
async fn unparseable_line_becomes_raw_system_event() {
    let dir = tempdir().unwrap();
    let (store, task_id) = store_with_running_task(dir.path());

    let agent = Arc::new(FakeAgentProcess::single(ScriptedRun::new(
        vec!["not json at all".into()],
        0,
    )));
    let runner = AgentRunner::new(store.clone(), agent);
    let clock = FakeClock::new(epoch());

    runner.run(task_id, "do it", None, &clock, &|_, _| {}).await.unwrap();

    let (_, events) = store.get_task_with_events(task_id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, oj_core::EventCategory::System);
    assert_eq!(events[0].payload["type"], "raw");
}

#[tokio::test]
async fn spawn_failure_marks_task_failed() {
    let dir = tempdir().unwrap();
    let (store, task_id) = store_with_running_task(dir.path());

    let agent = Arc::new(FakeAgentProcess::new(vec![]));
    let runner = AgentRunner::new(store.clone(), agent);
    let clock = FakeClock::new(epoch());

    runner.run(task_id, "do it", None, &clock, &|_, _| {}).await.unwrap();

    assert_eq!(store.get_task(task_id).unwrap().status, TaskStatus::Failed);
}
