// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oj_core::{EventCategory, FakeClock, PlanGroupStatus, TaskStatus};
use serde_json::json;
use tempfile::tempdir;

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(1_000_000, 0).unwrap()
}

#[test]
fn create_links_group_and_planner_task() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());

    let (group_id, planner_id) = create(&store, "ship it", &clock).unwrap();

    let task = store.get_task(planner_id).unwrap();
    assert_eq!(task.mode, TaskMode::Plan);
    assert_eq!(task.plan_group_id, Some(group_id));
    assert_eq!(store.get_plan_group(group_id).unwrap().status, oj_core::PlanGroupStatus::Planning);
}

#[test]
fn parse_on_complete_prefers_result_text_over_events() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());
    let (group_id, planner_id) = create(&store, "goal", &clock).unwrap();

    store.mark_task_running(planner_id, None, epoch()).unwrap();
    store
        .finish_task(
            planner_id,
            TaskStatus::Completed,
            Some(r#"{"summary":"s","steps":[{"title":"A","prompt":"do a"}]}"#.to_string()),
            None,
            epoch(),
        )
        .unwrap();

    parse_on_complete(&store, planner_id).unwrap();

    let group = store.get_plan_group(group_id).unwrap();
    assert_eq!(group.status, PlanGroupStatus::Reviewing);
    assert_eq!(group.plan_text.unwrap()["steps"][0]["title"], "A");
}

#[test]
fn parse_on_complete_falls_back_to_result_event_then_assistant_event() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());
    let (group_id, planner_id) = create(&store, "goal", &clock).unwrap();

    store.mark_task_running(planner_id, None, epoch()).unwrap();
    store
        .append_task_event(
            planner_id,
            EventCategory::Assistant,
            json!({"text": "here is my plan: {\"steps\": [{\"title\": \"A\", \"prompt\": \"a\"}]} thanks"}),
            epoch(),
        )
        .unwrap();
    store.finish_task(planner_id, TaskStatus::Completed, None, None, epoch()).unwrap();

    parse_on_complete(&store, planner_id).unwrap();

    let group = store.get_plan_group(group_id).unwrap();
    assert_eq!(group.status, PlanGroupStatus::Reviewing);
    assert_eq!(group.plan_text.unwrap()["steps"][0]["title"], "A");
}

#[test]
fn parse_on_complete_stores_raw_text_on_unparseable_output() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());
    let (group_id, planner_id) = create(&store, "goal", &clock).unwrap();

    store.mark_task_running(planner_id, None, epoch()).unwrap();
    store
        .finish_task(planner_id, TaskStatus::Completed, Some("not json at all".to_string()), None, epoch())
        .unwrap();

    parse_on_complete(&store, planner_id).unwrap();

    let group = store.get_plan_group(group_id).unwrap();
    assert_eq!(group.status, PlanGroupStatus::Reviewing);
    assert_eq!(group.plan_text, Some(json!("not json at all")));
}

#[test]
fn approve_creates_tasks_with_strictly_decreasing_priority() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());
    let (group_id, planner_id) = create(&store, "goal", &clock).unwrap();
    store.mark_task_running(planner_id, None, epoch()).unwrap();
    store
        .finish_task(
            planner_id,
            TaskStatus::Completed,
            Some(r#"{"steps":[{"title":"A","prompt":"a"},{"title":"B","prompt":"b"}]}"#.to_string()),
            None,
            epoch(),
        )
        .unwrap();
    parse_on_complete(&store, planner_id).unwrap();

    let child_ids = approve(&store, group_id, None, &clock).unwrap();

    assert_eq!(child_ids.len(), 2);
    let t0 = store.get_task(child_ids[0]).unwrap();
    let t1 = store.get_task(child_ids[1]).unwrap();
    assert_eq!(t0.priority, 2);
    assert_eq!(t1.priority, 1);
    assert!(t0.priority > t1.priority);
    assert_eq!(t0.plan_group_id, Some(group_id));
    assert_eq!(store.get_plan_group(group_id).unwrap().status, PlanGroupStatus::Executing);
}

#[test]
fn approve_on_unparseable_plan_yields_exactly_one_subtask() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());
    let (group_id, planner_id) = create(&store, "goal", &clock).unwrap();
    store.mark_task_running(planner_id, None, epoch()).unwrap();
    store
        .finish_task(planner_id, TaskStatus::Completed, Some("garbage output".to_string()), None, epoch())
        .unwrap();
    parse_on_complete(&store, planner_id).unwrap();

    let child_ids = approve(&store, group_id, None, &clock).unwrap();

    assert_eq!(child_ids.len(), 1);
    assert_eq!(store.get_task(child_ids[0]).unwrap().prompt, "garbage output");
}

#[test]
fn edit_replaces_plan_text_while_reviewing() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new(epoch());
    let (group_id, planner_id) = create(&store, "goal", &clock).unwrap();
    store.mark_task_running(planner_id, None, epoch()).unwrap();
    store
        .finish_task(planner_id, TaskStatus::Completed, Some(r#"{"steps":[]}"#.to_string()), None, epoch())
        .unwrap();
    parse_on_complete(&store, planner_id).unwrap();

    edit(&store, group_id, json!({"steps": [{"title": "Z", "prompt": "z"}]})).unwrap();

    let group = store.get_plan_group(group_id).unwrap();
    assert_eq!(group.plan_text.unwrap()["steps"][0]["title"], "Z");
}
