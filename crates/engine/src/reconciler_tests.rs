// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{container_breed, reconciler, script_breed, small_scale};
use std::collections::BTreeSet;
use std::time::Duration;
use wf_adapters::{AdapterCall, FakeAdapters, FakeOp, ReportKind};
use wf_core::Schedule;
use yare::parameterized;

fn tags(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn publish(items: &[&str]) -> AdapterCall {
    AdapterCall::Publish {
        tags: tags(items),
        index_value: false,
    }
}

fn update_status(name: &str, status: WorkflowStatus) -> AdapterCall {
    AdapterCall::UpdateStatus {
        name: name.to_string(),
        status,
    }
}

fn unschedule(workflow: &str) -> AdapterCall {
    AdapterCall::Unschedule {
        workflow: workflow.to_string(),
    }
}

fn unregister(name: &str) -> AdapterCall {
    AdapterCall::Unregister {
        name: name.to_string(),
    }
}

/// Seed `workflow` with its breed and scale so every pass can resolve
fn seeded(workflow: &Workflow) -> FakeAdapters {
    let fake = FakeAdapters::new();
    fake.add_breed(container_breed("hello"));
    fake.add_scale(small_scale());
    fake.add_workflow(workflow.clone());
    fake
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

// =============================================================================
// run
// =============================================================================

#[tokio::test]
async fn run_is_idempotent_when_already_running() {
    let workflow =
        Workflow::new("w1", "hello", Schedule::Daemon).with_status(WorkflowStatus::Running);
    let fake = seeded(&workflow);

    let transition = reconciler(&fake).update(&workflow, true).await.unwrap();

    assert_eq!(transition, Transition::Unchanged);
    assert!(fake.calls().is_empty());
    assert!(fake.published().is_empty());
}

#[tokio::test]
async fn event_workflow_start_registers_then_records_then_publishes() {
    let workflow = Workflow::new("w1", "hello", Schedule::event(["deploy-now"]));
    let fake = seeded(&workflow);

    let transition = reconciler(&fake).update(&workflow, false).await.unwrap();

    assert_eq!(transition, Transition::Persisted(WorkflowStatus::Running));
    assert_eq!(
        fake.calls(),
        vec![
            AdapterCall::Register {
                name: "workflow://w1".to_string(),
                tags: tags(&["deploy-now"]),
                workflow: "w1".to_string(),
            },
            update_status("w1", WorkflowStatus::Running),
            publish(&["workflows:w1", "scheduled"]),
        ]
    );
    assert_eq!(fake.workflow("w1").unwrap().status, WorkflowStatus::Running);
}

#[tokio::test]
async fn matched_event_schedules_once_without_staging() {
    let workflow = Workflow::new("w1", "hello", Schedule::event(["deploy-now"]))
        .with_scale("small")
        .with_status(WorkflowStatus::Running);
    let fake = seeded(&workflow);
    let event = Event::new(["deploy-now"], serde_json::json!({"commit": "abc"}), "custom");

    reconciler(&fake)
        .handle(Message::Trigger {
            workflow: workflow.clone(),
            event: event.clone(),
        })
        .await;

    let calls = fake.calls();
    assert!(calls.contains(&AdapterCall::ResolveBreed {
        name: "hello".to_string()
    }));
    assert!(calls.contains(&AdapterCall::ResolveScale {
        name: "small".to_string()
    }));
    let schedules: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, AdapterCall::Schedule { .. }))
        .cloned()
        .collect();
    assert_eq!(
        schedules,
        vec![AdapterCall::Schedule {
            workflow: "w1".to_string(),
            breed: "hello".to_string(),
            scale: Some("small".to_string()),
            trigger: Some(event),
        }]
    );
    assert!(!calls.iter().any(|c| matches!(c, AdapterCall::KvSet { .. })));
    assert!(fake.reports().is_empty());
}

#[tokio::test]
async fn starting_daemon_stages_script_before_scheduling() {
    let workflow = Workflow::new("w1", "script", Schedule::Daemon);
    let fake = seeded(&workflow);
    fake.add_breed(script_breed("script"));

    reconciler(&fake).update(&workflow, false).await.unwrap();

    let calls = fake.calls();
    let position = |pred: fn(&AdapterCall) -> bool| calls.iter().position(pred).unwrap();
    let kv = position(|c| matches!(c, AdapterCall::KvSet { .. }));
    let schedule = position(|c| matches!(c, AdapterCall::Schedule { .. }));
    let status = position(|c| matches!(c, AdapterCall::UpdateStatus { .. }));
    assert!(kv < schedule && schedule < status);
}

#[tokio::test]
async fn starting_with_activation_engaged_only_records_status() {
    let workflow = Workflow::new("w1", "hello", Schedule::Daemon);
    let fake = seeded(&workflow);

    let transition = reconciler(&fake).update(&workflow, true).await.unwrap();

    assert_eq!(transition, Transition::Persisted(WorkflowStatus::Running));
    assert_eq!(
        fake.calls(),
        vec![
            update_status("w1", WorkflowStatus::Running),
            publish(&["workflows:w1", "scheduled"]),
        ]
    );
}

#[tokio::test]
async fn lifecycle_event_carries_updated_snapshot() {
    let workflow = Workflow::new("w1", "hello", Schedule::Daemon);
    let fake = seeded(&workflow);

    reconciler(&fake).update(&workflow, false).await.unwrap();

    let published = fake.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, "workflow");
    assert_eq!(published[0].value["name"], "w1");
    assert_eq!(published[0].value["status"], "running");
}

// =============================================================================
// stop
// =============================================================================

#[parameterized(
    daemon = { Schedule::Daemon, unschedule("w1") },
    event = { Schedule::event(["deploy-now"]), unregister("workflow://w1") },
)]
fn stop_cleans_up_in_order(schedule: Schedule, undeploy: AdapterCall) {
    block_on(async {
        let workflow =
            Workflow::new("w1", "hello", schedule).with_status(WorkflowStatus::Stopping);
        let fake = seeded(&workflow);

        let transition = reconciler(&fake).update(&workflow, true).await.unwrap();

        assert_eq!(transition, Transition::Deleted);
        assert_eq!(
            fake.calls(),
            vec![
                undeploy,
                AdapterCall::DeleteWorkflow {
                    name: "w1".to_string()
                },
                AdapterCall::ResetWorkflow {
                    name: "w1".to_string()
                },
                publish(&["workflows:w1", "unscheduled"]),
            ]
        );
        assert!(fake.workflow("w1").is_none());
        assert_eq!(fake.resets(), vec!["w1".to_string()]);
    });
}

#[tokio::test]
async fn failed_delete_publishes_nothing() {
    let workflow =
        Workflow::new("w1", "hello", Schedule::Daemon).with_status(WorkflowStatus::Stopping);
    let fake = seeded(&workflow);
    fake.set_failing(FakeOp::DeleteWorkflow, true);

    assert!(reconciler(&fake).update(&workflow, true).await.is_err());
    assert!(fake.published().is_empty());
    assert!(fake.resets().is_empty());
}

// =============================================================================
// suspend
// =============================================================================

#[tokio::test]
async fn suspending_undeploys_then_records_suspended() {
    let workflow =
        Workflow::new("w1", "hello", Schedule::Daemon).with_status(WorkflowStatus::Suspending);
    let fake = seeded(&workflow);

    let transition = reconciler(&fake).update(&workflow, true).await.unwrap();

    assert_eq!(transition, Transition::Persisted(WorkflowStatus::Suspended));
    assert_eq!(
        fake.calls(),
        vec![
            unschedule("w1"),
            update_status("w1", WorkflowStatus::Suspended),
            publish(&["workflows:w1", "unscheduled"]),
        ]
    );
}

#[tokio::test]
async fn suspended_and_idle_is_unchanged() {
    let workflow =
        Workflow::new("w1", "hello", Schedule::Daemon).with_status(WorkflowStatus::Suspended);
    let fake = seeded(&workflow);

    let transition = reconciler(&fake).update(&workflow, false).await.unwrap();

    assert_eq!(transition, Transition::Unchanged);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn suspended_event_workflow_still_unregisters() {
    let workflow = Workflow::new("w1", "hello", Schedule::event(["go"]))
        .with_status(WorkflowStatus::Suspended);
    let fake = seeded(&workflow);

    reconciler(&fake).update(&workflow, false).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![unregister("workflow://w1")]
    );
}

// =============================================================================
// restart
// =============================================================================

#[tokio::test]
async fn two_phase_restart_converges_to_running() {
    let workflow = Workflow::new("w1", "hello", Schedule::Daemon)
        .with_status(WorkflowStatus::Restarting(None));
    let fake = seeded(&workflow);
    fake.mark_scheduled("w1");
    let reconciler = reconciler(&fake);

    // First tick: the driver still runs it
    let first = fake.workflow("w1").unwrap();
    assert_eq!(
        reconciler.update(&first, true).await.unwrap(),
        Transition::Persisted(WorkflowStatus::Restarting(Some(RestartPhase::Starting)))
    );

    // Second tick sees the persisted phase
    let second = fake.workflow("w1").unwrap();
    assert_eq!(
        second.status,
        WorkflowStatus::Restarting(Some(RestartPhase::Starting))
    );
    assert_eq!(
        reconciler.update(&second, false).await.unwrap(),
        Transition::Persisted(WorkflowStatus::Running)
    );

    assert_eq!(fake.workflow("w1").unwrap().status, WorkflowStatus::Running);
    let statuses: Vec<_> = fake
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            AdapterCall::UpdateStatus { status, .. } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            WorkflowStatus::Restarting(Some(RestartPhase::Starting)),
            WorkflowStatus::Running,
        ]
    );
    let markers: Vec<_> = fake
        .published()
        .iter()
        .map(|e| e.tags.contains("scheduled"))
        .collect();
    assert_eq!(markers, vec![false, true]);
}

#[tokio::test]
async fn restart_of_event_workflow_reregisters() {
    let workflow = Workflow::new("w1", "hello", Schedule::event(["go"]))
        .with_status(WorkflowStatus::Restarting(None));
    let fake = seeded(&workflow);
    let reconciler = reconciler(&fake);

    reconciler.update(&workflow, true).await.unwrap();
    let second = fake.workflow("w1").unwrap();
    reconciler.update(&second, true).await.unwrap();

    let subscription_calls: Vec<_> = fake
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                AdapterCall::Register { .. } | AdapterCall::Unregister { .. }
            )
        })
        .collect();
    assert_eq!(subscription_calls.len(), 2);
    assert!(matches!(subscription_calls[0], AdapterCall::Unregister { .. }));
    assert!(matches!(subscription_calls[1], AdapterCall::Register { .. }));
}

#[tokio::test]
async fn failed_redeploy_leaves_phase_for_next_tick() {
    let workflow = Workflow::new("w1", "hello", Schedule::Daemon)
        .with_status(WorkflowStatus::Restarting(Some(RestartPhase::Starting)));
    let fake = seeded(&workflow);
    fake.set_failing(FakeOp::Schedule, true);

    assert!(reconciler(&fake).update(&workflow, false).await.is_err());
    assert_eq!(
        fake.workflow("w1").unwrap().status,
        WorkflowStatus::Restarting(Some(RestartPhase::Starting))
    );
    assert!(fake.published().is_empty());
}

// =============================================================================
// schedule None
// =============================================================================

#[parameterized(
    starting = { WorkflowStatus::Starting },
    stopping = { WorkflowStatus::Stopping },
    suspending = { WorkflowStatus::Suspending },
    restarting = { WorkflowStatus::Restarting(None) },
    redeploying = { WorkflowStatus::Restarting(Some(RestartPhase::Starting)) },
)]
fn unscheduled_workflow_is_left_alone(status: WorkflowStatus) {
    block_on(async {
        let workflow = Workflow::new("w1", "hello", Schedule::None).with_status(status);
        let fake = seeded(&workflow);

        let transition = reconciler(&fake).update(&workflow, true).await.unwrap();

        assert_eq!(transition, Transition::Idle);
        assert!(fake.calls().is_empty());
        assert_eq!(fake.workflow("w1").unwrap().status, status);
    });
}

// =============================================================================
// message boundary
// =============================================================================

#[tokio::test]
async fn update_failure_is_reported_as_scheduling_error() {
    let workflow = Workflow::new("w1", "hello", Schedule::event(["go"]));
    let fake = seeded(&workflow);
    fake.set_failing(FakeOp::Register, true);

    reconciler(&fake)
        .handle(Message::update(workflow, false))
        .await;

    let reports = fake.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ReportKind::Scheduling);
    assert_eq!(reports[0].workflow, "w1");
    assert_eq!(reports[0].collaborator, Some(Collaborator::EventBus));
    assert_eq!(fake.workflow("w1").unwrap().status, WorkflowStatus::Starting);
    assert!(fake.published().is_empty());
}

#[tokio::test]
async fn trigger_with_missing_breed_is_reported_as_execution_error() {
    let workflow = Workflow::new("w1", "ghost", Schedule::event(["go"]));
    let fake = seeded(&workflow);

    reconciler(&fake)
        .handle(Message::Trigger {
            workflow,
            event: Event::new(["go"], serde_json::Value::Null, "custom"),
        })
        .await;

    let reports = fake.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ReportKind::Execution);
    assert_eq!(reports[0].message, "breed not found: ghost");
}

#[tokio::test]
async fn failed_status_write_publishes_nothing() {
    let workflow = Workflow::new("w1", "hello", Schedule::Daemon);
    let fake = seeded(&workflow);
    fake.set_failing(FakeOp::UpdateStatus, true);

    let err = reconciler(&fake).update(&workflow, false).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Scheduling { .. }));
    assert!(fake.published().is_empty());
}

#[tokio::test]
async fn slow_bus_fails_the_pass_without_status_write() {
    let workflow = Workflow::new("w1", "hello", Schedule::event(["go"]));
    let fake = seeded(&workflow);
    fake.set_delay(FakeOp::Register, Duration::from_secs(2));

    reconciler(&fake)
        .handle(Message::update(workflow, false))
        .await;

    let reports = fake.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("no answer within"));
    assert!(!fake
        .calls()
        .iter()
        .any(|c| matches!(c, AdapterCall::UpdateStatus { .. })));
}

#[tokio::test]
async fn unknown_message_is_ignored() {
    let fake = FakeAdapters::new();

    reconciler(&fake).handle(Message::Unknown).await;

    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn requested_status_is_written_without_side_effects() {
    let workflow = Workflow::new("w1", "hello", Schedule::Daemon);
    let fake = seeded(&workflow);

    reconciler(&fake)
        .handle(Message::SetStatus {
            name: "w1".to_string(),
            status: WorkflowStatus::Stopping,
        })
        .await;

    assert_eq!(
        fake.calls(),
        vec![update_status("w1", WorkflowStatus::Stopping)]
    );
    assert_eq!(fake.workflow("w1").unwrap().status, WorkflowStatus::Stopping);
    assert!(fake.published().is_empty());
}

#[tokio::test]
async fn requested_status_for_unknown_workflow_is_reported() {
    let fake = FakeAdapters::new();

    reconciler(&fake)
        .handle(Message::SetStatus {
            name: "ghost".to_string(),
            status: WorkflowStatus::Running,
        })
        .await;

    let reports = fake.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ReportKind::Scheduling);
    assert_eq!(reports[0].workflow, "ghost");
    assert_eq!(reports[0].collaborator, Some(Collaborator::Persistence));
}
