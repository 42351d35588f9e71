// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_adapters::{FakeAgentProcess, NoopProgressRecorder, ScriptedRun};
use oj_core::{FakeClock, PlanGroupStatus, TaskMode};
use serde_json::json;
use tempfile::tempdir;
use tokio::process::Command;
use tokio::time::{sleep, Duration};

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(1_000_000, 0).unwrap()
}

async fn init_repo(root: &std::path::Path) {
    for args in [
        vec!["init", "-q"],
        vec!["config", "user.email", "oj@example.com"],
        vec!["config", "user.name", "oj"],
        vec!["commit", "-q", "--allow-empty", "-m", "init"],
    ] {
        let status = Command::new("git").current_dir(root).args(&args).status().await.unwrap();
        assert!(status.success());
    }
}

fn result_line(text: &str) -> String {
    json!({
        "type": "result",
        "result": text,
        "usage": {"input_tokens": 10, "output_tokens": 10},
    })
    .to_string()
}

async fn until<F: Fn() -> bool>(cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}

#[tokio::test]
async fn dispatches_highest_priority_first_with_one_worker() {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(&dir.path().join("db")).unwrap());
    let pool = Arc::new(WorkingCopyPool::init(store.clone(), dir.path().to_path_buf(), "oj", None, 0).await.unwrap());
    let bus = Arc::new(EventBus::new());
    let agent = Arc::new(FakeAgentProcess::new(vec![
        ScriptedRun::new(vec![result_line("first")], 0),
        ScriptedRun::new(vec![result_line("second")], 0),
    ]));
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(epoch()));

    store.create_task("low priority", TaskMode::Execute, 1, None, None, epoch()).unwrap();
    store.create_task("high priority", TaskMode::Execute, 5, None, None, epoch()).unwrap();

    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        pool,
        bus,
        agent.clone(),
        Arc::new(NoopProgressRecorder),
        clock,
        1,
    ));
    scheduler.start();

    until(|| store.list_tasks(Some(TaskStatus::Completed)).len() == 2).await;
    scheduler.stop().await;

    let spawned = agent.spawned_with();
    assert_eq!(spawned.len(), 2);
    assert_eq!(spawned[0].0, "high priority");
    assert_eq!(spawned[1].0, "low priority");
}

#[tokio::test]
async fn scheduler_status_is_published_after_a_fill_pass() {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(&dir.path().join("db")).unwrap());
    let pool = Arc::new(WorkingCopyPool::init(store.clone(), dir.path().to_path_buf(), "oj", None, 0).await.unwrap());
    let bus = Arc::new(EventBus::new());
    let agent = Arc::new(FakeAgentProcess::single(ScriptedRun::new(vec![result_line("done")], 0)));
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(epoch()));
    let mut rx = bus.subscribe_global();

    store.create_task("p", TaskMode::Execute, 0, None, None, epoch()).unwrap();

    let scheduler = Arc::new(Scheduler::new(store.clone(), pool, bus, agent, Arc::new(NoopProgressRecorder), clock, 1));
    scheduler.start();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.task_id, SYSTEM_TASK_ID);
    assert_eq!(event.payload["type"], "scheduler_status");

    until(|| store.list_tasks(Some(TaskStatus::Completed)).len() == 1).await;
    scheduler.stop().await;
}

#[tokio::test]
async fn completion_hook_releases_working_copy_back_to_idle() {
    let dir = tempdir().unwrap();
    init_repo(dir.path()).await;
    let store = Arc::new(Store::open(&dir.path().join("db")).unwrap());
    let pool = Arc::new(WorkingCopyPool::init(store.clone(), dir.path().to_path_buf(), "oj", None, 1).await.unwrap());
    let bus = Arc::new(EventBus::new());
    let agent = Arc::new(FakeAgentProcess::single(ScriptedRun::new(vec![result_line("done")], 0)));
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(epoch()));

    store.create_task("p", TaskMode::Execute, 0, None, None, epoch()).unwrap();

    let scheduler = Arc::new(Scheduler::new(store.clone(), pool, bus, agent, Arc::new(NoopProgressRecorder), clock, 1));
    scheduler.start();

    until(|| store.list_tasks(Some(TaskStatus::Completed)).len() == 1).await;
    scheduler.stop().await;

    let wc = store.list_working_copies().into_iter().next().unwrap();
    assert_eq!(wc.status, oj_core::WorkingCopyStatus::Idle);
}

#[tokio::test]
async fn plan_group_completes_once_its_only_child_finishes() {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(&dir.path().join("db")).unwrap());
    let pool = Arc::new(WorkingCopyPool::init(store.clone(), dir.path().to_path_buf(), "oj", None, 0).await.unwrap());
    let bus = Arc::new(EventBus::new());
    let agent = Arc::new(FakeAgentProcess::single(ScriptedRun::new(vec![result_line("done")], 0)));
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(epoch()));

    let planner = store.create_task("plan it", TaskMode::Plan, 0, None, None, epoch()).unwrap();
    let group = store.create_plan_group("ship it", planner, epoch()).unwrap();
    let child = store.create_task("do the step", TaskMode::Execute, 0, None, Some(group), epoch()).unwrap();
    store.approve_plan(group, vec![child]).unwrap();

    let scheduler = Arc::new(Scheduler::new(store.clone(), pool, bus, agent, Arc::new(NoopProgressRecorder), clock, 1));
    scheduler.start();

    until(|| store.get_plan_group(group).unwrap().status == PlanGroupStatus::Completed).await;
    scheduler.stop().await;

    assert_eq!(store.get_task(child).unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn stop_awaits_in_flight_task_and_leaves_no_slot_busy() {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(&dir.path().join("db")).unwrap());
    let pool = Arc::new(WorkingCopyPool::init(store.clone(), dir.path().to_path_buf(), "oj", None, 0).await.unwrap());
    let bus = Arc::new(EventBus::new());
    let agent = Arc::new(FakeAgentProcess::single(
        ScriptedRun::new(vec![result_line("line1"), result_line("line2")], 0),
    ));
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(epoch()));

    store.create_task("p", TaskMode::Execute, 0, None, None, epoch()).unwrap();

    let scheduler = Arc::new(Scheduler::new(store.clone(), pool, bus, agent, Arc::new(NoopProgressRecorder), clock, 2));
    scheduler.start();

    until(|| store.list_tasks(Some(TaskStatus::Running)).len() == 1).await;
    scheduler.stop().await;

    assert!(scheduler.snapshot().iter().all(|w| w.status == SlotStatus::Idle));
}
