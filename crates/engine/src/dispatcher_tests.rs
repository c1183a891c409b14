// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use std::time::Duration;
use wf_core::{Event, Schedule, Workflow, WorkflowStatus};

/// Records handled messages and the peak overlap per workflow
#[derive(Default)]
struct RecordingHandler {
    delay: Duration,
    state: Mutex<RecordingState>,
}

#[derive(Default)]
struct RecordingState {
    handled: Vec<String>,
    active: HashMap<String, usize>,
    max_overlap: HashMap<String, usize>,
    max_total: usize,
}

impl RecordingHandler {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn handled(&self) -> Vec<String> {
        self.state.lock().unwrap().handled.clone()
    }

    fn max_overlap(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .max_overlap
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn max_total(&self) -> usize {
        self.state.lock().unwrap().max_total
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: Message) {
        let name = message.workflow_name().unwrap_or("?").to_string();
        {
            let mut state = self.state.lock().unwrap();
            let active = state.active.entry(name.clone()).or_default();
            *active += 1;
            let now = *active;
            let peak = state.max_overlap.entry(name.clone()).or_default();
            *peak = (*peak).max(now);
            let total: usize = state.active.values().sum();
            state.max_total = state.max_total.max(total);
        }
        tokio::time::sleep(self.delay).await;
        let mut state = self.state.lock().unwrap();
        if let Some(active) = state.active.get_mut(&name) {
            *active -= 1;
        }
        state.handled.push(name);
    }
}

fn update(name: &str) -> Message {
    Message::update(Workflow::new(name, "hello", Schedule::Daemon), false)
}

fn trigger(name: &str) -> Message {
    Message::Trigger {
        workflow: Workflow::new(name, "hello", Schedule::event(["go"])),
        event: Event::new(["go"], serde_json::Value::Null, "custom"),
    }
}

fn set_status(name: &str) -> Message {
    Message::SetStatus {
        name: name.to_string(),
        status: WorkflowStatus::Stopping,
    }
}

#[tokio::test]
async fn same_workflow_never_overlaps() {
    let handler = Arc::new(RecordingHandler::with_delay(Duration::from_millis(20)));
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 4);

    for _ in 0..5 {
        assert!(dispatcher.dispatch(trigger("w1")));
    }
    dispatcher.shutdown().await;

    assert_eq!(handler.handled().len(), 5);
    assert_eq!(handler.max_overlap("w1"), 1);
}

#[tokio::test]
async fn pending_update_coalesces_later_updates() {
    let handler = Arc::new(RecordingHandler::with_delay(Duration::from_millis(50)));
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 2);

    assert!(dispatcher.dispatch(update("w1")));
    assert!(!dispatcher.dispatch(update("w1")));
    assert!(!dispatcher.dispatch(update("w1")));
    assert!(dispatcher.dispatch(update("w2")));
    assert_eq!(dispatcher.pending(), 2);

    dispatcher.shutdown().await;

    let mut handled = handler.handled();
    handled.sort();
    assert_eq!(handled, vec!["w1", "w2"]);
}

#[tokio::test]
async fn update_is_accepted_again_once_processed() {
    let handler = Arc::new(RecordingHandler::default());
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 1);

    assert!(dispatcher.dispatch(update("w1")));
    for _ in 0..100 {
        if dispatcher.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(dispatcher.pending(), 0);
    assert!(dispatcher.dispatch(update("w1")));

    dispatcher.shutdown().await;
    assert_eq!(handler.handled().len(), 2);
}

#[tokio::test]
async fn triggers_are_never_coalesced() {
    let handler = Arc::new(RecordingHandler::with_delay(Duration::from_millis(10)));
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 1);

    assert!(dispatcher.dispatch(update("w1")));
    assert!(dispatcher.dispatch(trigger("w1")));
    assert!(dispatcher.dispatch(trigger("w1")));
    dispatcher.shutdown().await;

    assert_eq!(handler.handled().len(), 3);
}

#[tokio::test]
async fn different_workflows_can_run_concurrently() {
    let handler = Arc::new(RecordingHandler::with_delay(Duration::from_millis(100)));
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 8);

    for i in 0..16 {
        dispatcher.dispatch(update(&format!("w{}", i)));
    }
    dispatcher.shutdown().await;

    assert_eq!(handler.handled().len(), 16);
    assert!(handler.max_total() > 1);
}

#[tokio::test]
async fn unknown_message_is_dropped() {
    let handler = Arc::new(RecordingHandler::default());
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 1);

    assert!(!dispatcher.dispatch(Message::Unknown));
    dispatcher.shutdown().await;

    assert!(handler.handled().is_empty());
}

#[tokio::test]
async fn zero_workers_still_spawns_one() {
    let handler = Arc::new(RecordingHandler::default());
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 0);

    assert!(dispatcher.dispatch(update("w1")));
    dispatcher.shutdown().await;

    assert_eq!(handler.handled(), vec!["w1"]);
}

#[tokio::test]
async fn queued_status_write_holds_back_updates() {
    let handler = Arc::new(RecordingHandler::with_delay(Duration::from_millis(50)));
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 1);

    assert!(dispatcher.dispatch(update("w1")));
    assert!(dispatcher.dispatch(set_status("w1")));
    assert!(dispatcher.dispatch(set_status("w1")));
    // An update built before the writes land would carry the old status
    assert!(!dispatcher.dispatch(update("w1")));

    for _ in 0..100 {
        if dispatcher.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(dispatcher.pending(), 0);
    assert_eq!(handler.handled().len(), 3);
    assert!(dispatcher.dispatch(update("w1")));

    dispatcher.shutdown().await;
    assert_eq!(handler.handled().len(), 4);
}

/// Panics on workflow "boom", records everything else
struct PanickingHandler {
    inner: RecordingHandler,
}

#[async_trait]
impl MessageHandler for PanickingHandler {
    async fn handle(&self, message: Message) {
        if message.workflow_name() == Some("boom") {
            panic!("handler failure");
        }
        self.inner.handle(message).await;
    }
}

#[tokio::test]
async fn panicking_pass_does_not_stop_the_worker() {
    let handler = Arc::new(PanickingHandler {
        inner: RecordingHandler::default(),
    });
    let dispatcher = Dispatcher::spawn(Arc::clone(&handler), 1);

    assert!(dispatcher.dispatch(update("boom")));
    assert!(dispatcher.dispatch(update("w1")));
    for _ in 0..100 {
        if dispatcher.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(dispatcher.pending(), 0);
    assert!(dispatcher.dispatch(update("boom")));

    dispatcher.shutdown().await;
    assert_eq!(handler.inner.handled(), vec!["w1"]);
}
