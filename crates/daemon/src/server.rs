// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use std::str::FromStr;

use tokio::net::UnixStream;
use tracing::{debug, error, info};
use wf_adapters::{DriverAdapter, EventBusAdapter};
use wf_core::{Event, WorkflowStatus};
use wf_engine::Message;

use crate::lifecycle::DaemonState;
use crate::protocol::{
    self, Query, Request, Response, WorkflowDetail, WorkflowSummary, DEFAULT_TIMEOUT,
    PROTOCOL_VERSION,
};

/// Event kind for events published through the socket
pub const CUSTOM_EVENT_KIND: &str = "custom";

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    // Split stream for reading/writing
    let (mut reader, mut writer) = stream.into_split();

    // Read request with timeout
    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handle_request(daemon, request).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub async fn handle_request(daemon: &mut DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Status => status(daemon).await,

        Request::Query { query } => handle_query(daemon, query),

        Request::Publish { tags, value } => {
            if tags.iter().all(|t| t.trim().is_empty()) {
                return Response::Error {
                    message: "an event needs at least one tag".to_string(),
                };
            }
            let event = Event::new(tags, value, CUSTOM_EVENT_KIND);
            info!(tags = ?event.tags, "publishing custom event");
            daemon.bus.publish(event, true).await;
            Response::Ok
        }

        Request::SetStatus { name, status } => set_status(daemon, &name, &status),

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

async fn status(daemon: &DaemonState) -> Response {
    let uptime_secs = daemon.start_time.elapsed().as_secs();
    let (workflows, running) = daemon.store.read(|state| {
        let running = state
            .workflows
            .values()
            .filter(|w| w.status == WorkflowStatus::Running)
            .count();
        (state.workflows.len(), running)
    });
    let subscriptions = daemon
        .bus
        .subscriptions()
        .await
        .map(|s| s.len())
        .unwrap_or(0);
    let scheduled = daemon
        .driver
        .scheduled()
        .await
        .map(|s| s.len())
        .unwrap_or(0);
    let next_timer = daemon.driver.inner().next_timer();

    Response::Status {
        uptime_secs,
        workflows,
        running,
        subscriptions,
        scheduled,
        next_timer,
    }
}

/// Queue a new status on the workflow's worker, behind any pass already in
/// flight. The next tick reconciles toward it.
fn set_status(daemon: &DaemonState, name: &str, status: &str) -> Response {
    let status = match WorkflowStatus::from_str(status) {
        Ok(status) => status,
        Err(e) => {
            return Response::Error {
                message: e.to_string(),
            }
        }
    };

    if daemon.store.workflow(name).is_none() {
        return Response::Error {
            message: format!("workflow not found: {}", name),
        };
    }

    let message = Message::SetStatus {
        name: name.to_string(),
        status,
    };
    if !daemon.dispatch(message) {
        return Response::Error {
            message: "daemon is shutting down".to_string(),
        };
    }
    info!(workflow = name, %status, "status requested");
    Response::Ok
}

/// Handle query requests
fn handle_query(daemon: &DaemonState, query: Query) -> Response {
    match query {
        Query::ListWorkflows => daemon.store.read(|state| {
            let workflows = state
                .workflows
                .values()
                .map(|w| WorkflowSummary {
                    name: w.name.clone(),
                    breed: w.breed.clone(),
                    schedule: w.schedule.kind().to_string(),
                    status: w.status.to_string(),
                    runs: state.runtime.get(&w.name).map(|r| r.runs).unwrap_or(0),
                })
                .collect();
            Response::Workflows { workflows }
        }),

        Query::GetWorkflow { name } => daemon.store.read(|state| {
            let workflow = state.workflows.get(&name).map(|w| {
                let runtime = state.runtime.get(&name);
                Box::new(WorkflowDetail {
                    workflow: w.clone(),
                    runs: runtime.map(|r| r.runs).unwrap_or(0),
                    last_run: runtime.and_then(|r| r.last_run),
                })
            });
            Response::Workflow { workflow }
        }),

        Query::RecentEvents => Response::Events {
            events: daemon.bus.inner().history(),
        },
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
