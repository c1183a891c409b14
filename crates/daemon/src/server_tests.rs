// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::startup;
use crate::protocol::{read_response, write_request};
use crate::test_support::{eventually, project, MANIFEST};

/// Send one request over the daemon's socket and serve it
async fn roundtrip(daemon: &mut DaemonState, request: Request) -> Response {
    let path = daemon.config.socket_path.clone();
    let client = tokio::spawn(async move {
        let stream = UnixStream::connect(&path).await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        write_request(&mut writer, &request, DEFAULT_TIMEOUT)
            .await
            .unwrap();
        read_response(&mut reader, DEFAULT_TIMEOUT).await.unwrap()
    });

    let (stream, _) = daemon.listener.accept().await.unwrap();
    handle_connection(daemon, stream).await.unwrap();
    client.await.unwrap()
}

#[tokio::test]
async fn ping_and_hello() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    assert_eq!(roundtrip(&mut daemon, Request::Ping).await, Response::Pong);
    assert_eq!(
        roundtrip(
            &mut daemon,
            Request::Hello {
                version: "0".to_string()
            }
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_that_hangs_up_is_not_an_error() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    let path = daemon.config.socket_path.clone();
    let client = tokio::spawn(async move {
        drop(UnixStream::connect(&path).await.unwrap());
    });
    let (stream, _) = daemon.listener.accept().await.unwrap();
    client.await.unwrap();

    assert!(handle_connection(&mut daemon, stream).await.is_ok());
    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn list_and_get_workflows() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    let list = Request::Query {
        query: Query::ListWorkflows,
    };
    let Response::Workflows { workflows } = roundtrip(&mut daemon, list).await else {
        panic!("expected Workflows");
    };
    let names: Vec<&str> = workflows.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["idle", "w1", "w2"]);
    assert_eq!(workflows[1].schedule, "event");
    assert_eq!(workflows[1].status, "running");

    let get = Request::Query {
        query: Query::GetWorkflow {
            name: "w2".to_string(),
        },
    };
    let Response::Workflow {
        workflow: Some(detail),
    } = roundtrip(&mut daemon, get).await
    else {
        panic!("expected a workflow");
    };
    assert_eq!(detail.workflow.breed, "hello");
    assert_eq!(detail.runs, 0);

    let missing = Request::Query {
        query: Query::GetWorkflow {
            name: "ghost".to_string(),
        },
    };
    assert_eq!(
        roundtrip(&mut daemon, missing).await,
        Response::Workflow { workflow: None }
    );

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn set_status_validates_and_records() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    let bad_status = Request::SetStatus {
        name: "idle".to_string(),
        status: "paused".to_string(),
    };
    assert!(matches!(
        roundtrip(&mut daemon, bad_status).await,
        Response::Error { .. }
    ));

    let unknown = Request::SetStatus {
        name: "ghost".to_string(),
        status: "running".to_string(),
    };
    assert!(matches!(
        roundtrip(&mut daemon, unknown).await,
        Response::Error { .. }
    ));

    let suspend = Request::SetStatus {
        name: "idle".to_string(),
        status: "suspending".to_string(),
    };
    assert_eq!(roundtrip(&mut daemon, suspend).await, Response::Ok);
    {
        let d = &daemon;
        let suspending = || async move {
            d.store.workflow("idle").unwrap().status == WorkflowStatus::Suspending
        };
        assert!(eventually(suspending).await);
    }

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn stop_requested_during_a_pass_is_not_undone() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    // w2 is running with a pass queued from its old snapshot
    daemon.sync().await.unwrap();
    let stop = Request::SetStatus {
        name: "w2".to_string(),
        status: "stopping".to_string(),
    };
    assert_eq!(roundtrip(&mut daemon, stop).await, Response::Ok);

    {
        let d = &daemon;
        let removed = || async move {
            d.sync().await.unwrap();
            d.store.workflow("w2").is_none()
        };
        assert!(eventually(removed).await);
        assert!(d.driver.scheduled().await.unwrap().is_empty());
    }

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn publish_reaches_subscriptions() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    daemon.sync().await.unwrap();
    {
        let d = &daemon;
        let subscribed = || async move { !d.bus.subscriptions().await.unwrap().is_empty() };
        assert!(eventually(subscribed).await);
    }

    let empty = Request::Publish {
        tags: vec![" ".to_string()],
        value: serde_json::Value::Null,
    };
    assert!(matches!(
        roundtrip(&mut daemon, empty).await,
        Response::Error { .. }
    ));

    let publish = Request::Publish {
        tags: vec!["deploy-now".to_string()],
        value: serde_json::json!({"sha": "abc123"}),
    };
    assert_eq!(roundtrip(&mut daemon, publish).await, Response::Ok);

    let matched = daemon.triggers.recv().await.unwrap();
    assert_eq!(matched.workflow.name, "w1");
    assert_eq!(matched.event.value["sha"], "abc123");
    assert_eq!(matched.event.kind, CUSTOM_EVENT_KIND);

    let recent = Request::Query {
        query: Query::RecentEvents,
    };
    let Response::Events { events } = roundtrip(&mut daemon, recent).await else {
        panic!("expected Events");
    };
    let custom: Vec<_> = events
        .iter()
        .filter(|e| e.kind == CUSTOM_EVENT_KIND)
        .collect();
    assert_eq!(custom.len(), 1);
    assert!(custom[0].tags.contains("deploy-now"));

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn status_counts_workflows() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    let Response::Status {
        workflows,
        running,
        next_timer,
        ..
    } = roundtrip(&mut daemon, Request::Status).await
    else {
        panic!("expected Status");
    };
    assert_eq!(workflows, 3);
    assert_eq!(running, 2);
    assert_eq!(next_timer, None);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_request_sets_flag() {
    let project = project(MANIFEST);
    let mut daemon = startup(&project.config).await.unwrap();

    assert_eq!(
        roundtrip(&mut daemon, Request::Shutdown).await,
        Response::ShuttingDown
    );
    assert!(daemon.shutdown_requested);

    daemon.shutdown().await.unwrap();
}
