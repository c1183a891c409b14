// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::BTreeSet;
use wf_core::{Schedule, Workflow};

fn subscription(workflow: &str, tags: &[&str]) -> Subscription {
    let tags: BTreeSet<String> = tags.iter().map(|t| t.to_string()).collect();
    let workflow = Workflow::new(workflow, "hello", Schedule::Event { tags: tags.clone() });
    Subscription::for_workflow(&workflow, &tags)
}

#[tokio::test]
async fn matching_event_delivers_trigger() {
    let (bus, mut rx) = LocalEventBus::new(16);
    bus.register(subscription("w1", &["deploy-now"])).await.unwrap();

    let event = Event::new(["deploy-now", "prod"], serde_json::json!({"v": 1}), "custom");
    bus.publish(event.clone(), true).await;

    let trigger = rx.try_recv().unwrap();
    assert_eq!(trigger.workflow.name, "w1");
    assert_eq!(trigger.event, event);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn non_matching_event_delivers_nothing() {
    let (bus, mut rx) = LocalEventBus::new(16);
    bus.register(subscription("w1", &["deploy-now"])).await.unwrap();

    bus.publish(Event::new(["other"], serde_json::Value::Null, "custom"), true)
        .await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unregister_stops_delivery() {
    let (bus, mut rx) = LocalEventBus::new(16);
    bus.register(subscription("w1", &["deploy-now"])).await.unwrap();
    bus.unregister("workflow://w1").await.unwrap();

    bus.publish(Event::new(["deploy-now"], serde_json::Value::Null, "custom"), true)
        .await;

    assert!(rx.try_recv().is_err());
    assert!(bus.subscriptions().await.unwrap().is_empty());
}

#[tokio::test]
async fn unregister_unknown_subscription_is_ok() {
    let (bus, _rx) = LocalEventBus::new(16);
    assert!(bus.unregister("workflow://missing").await.is_ok());
}

#[tokio::test]
async fn history_is_bounded_and_drops_unindexed_values() {
    let (bus, _rx) = LocalEventBus::new(2);

    for i in 0..3 {
        bus.publish(
            Event::new([format!("e{}", i)], serde_json::json!({"i": i}), "custom"),
            i != 2,
        )
        .await;
    }

    let history = bus.history();
    assert_eq!(history.len(), 2);
    assert!(history[0].tags.contains("e1"));
    assert_eq!(history[0].value["i"], 1);
    assert!(history[1].value.is_null());
}
