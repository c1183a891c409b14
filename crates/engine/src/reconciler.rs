// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow reconciler: the status state machine
//!
//! | status                 | handler         |
//! |------------------------|-----------------|
//! | starting, running      | run             |
//! | stopping               | stop            |
//! | suspending, suspended  | suspend         |
//! | restarting/starting    | restart phase 2 |
//! | restarting             | restart phase 1 |
//!
//! Each handler performs its activation side effect first, then records the
//! new status, then publishes the lifecycle event. A failure at any step ends
//! the pass with nothing further written; the next update retries.

use crate::{Activation, Coordinator, EngineConfig, Message, ReconcileError, StepError};
use std::time::Instant;
use tracing::Instrument;
use wf_adapters::{
    Collaborator, DriverAdapter, EventBusAdapter, KeyValueAdapter, NotifyAdapter,
    PersistenceAdapter,
};
use wf_core::{Event, RestartPhase, Workflow, WorkflowStatus};

/// Collaborators the reconciler is built from
pub struct ReconcilerDeps<P, E, K, D, N> {
    pub persistence: P,
    pub bus: E,
    pub kv: K,
    pub driver: D,
    pub notify: N,
}

/// What an update pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The schedule has no activation mechanism; nothing was done
    Idle,
    /// Activation is in place and the status already matched
    Unchanged,
    /// A new status was recorded
    Persisted(WorkflowStatus),
    /// The workflow record was removed
    Deleted,
}

#[derive(Clone)]
pub struct Reconciler<P, E, K, D, N> {
    coordinator: Coordinator<P, E, K, D>,
    persistence: P,
    bus: E,
    notify: N,
    config: EngineConfig,
}

impl<P, E, K, D, N> Reconciler<P, E, K, D, N>
where
    P: PersistenceAdapter,
    E: EventBusAdapter,
    K: KeyValueAdapter,
    D: DriverAdapter,
    N: NotifyAdapter,
{
    pub fn new(deps: ReconcilerDeps<P, E, K, D, N>, config: EngineConfig) -> Self {
        Self {
            coordinator: Coordinator::new(
                deps.persistence.clone(),
                deps.bus.clone(),
                deps.kv,
                deps.driver,
                config,
            ),
            persistence: deps.persistence,
            bus: deps.bus,
            notify: deps.notify,
            config,
        }
    }

    /// Handle one message to completion.
    ///
    /// Failures are reported to the notification sink and never returned.
    pub async fn handle(&self, message: Message) {
        let result = match message {
            Message::Update { workflow, running } => {
                self.update(&workflow, running).await.map(|_| ())
            }
            Message::Trigger { workflow, event } => self.trigger(&workflow, &event).await,
            Message::SetStatus { name, status } => self.set_status(&name, status).await,
            Message::Unknown => {
                tracing::debug!("ignoring unrecognized message");
                return;
            }
        };

        if let Err(e) = result {
            tracing::error!(workflow = e.workflow(), error = %e, "reconciliation failed");
            self.notify.report(e.report()).await;
        }
    }

    /// Reconcile `workflow` toward its declared status
    pub async fn update(
        &self,
        workflow: &Workflow,
        running: bool,
    ) -> Result<Transition, ReconcileError> {
        let span = tracing::info_span!(
            "reconcile",
            workflow = %workflow.name,
            status = %workflow.status,
            running,
        );

        async move {
            let start = Instant::now();
            let result = self.update_inner(workflow, running).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(Transition::Persisted(status)) => {
                    tracing::info!(elapsed_ms, to = %status, "status recorded")
                }
                Ok(Transition::Deleted) => tracing::info!(elapsed_ms, "workflow removed"),
                Ok(transition) => tracing::debug!(elapsed_ms, ?transition, "reconciled"),
                Err(_) => {}
            }

            result.map_err(|source| ReconcileError::Scheduling {
                workflow: workflow.name.clone(),
                source,
            })
        }
        .instrument(span)
        .await
    }

    /// Execute an event-scheduled workflow once for a matched event
    pub async fn trigger(&self, workflow: &Workflow, event: &Event) -> Result<(), ReconcileError> {
        let span = tracing::info_span!("trigger", workflow = %workflow.name);

        async move {
            tracing::info!(tags = ?event.tags, "trigger matched");
            self.coordinator
                .resolver()
                .trigger(workflow, Some(event))
                .await
                .map_err(|source| ReconcileError::Execution {
                    workflow: workflow.name.clone(),
                    source,
                })
        }
        .instrument(span)
        .await
    }

    /// Record a status requested from outside the reconciler
    pub async fn set_status(
        &self,
        name: &str,
        status: WorkflowStatus,
    ) -> Result<(), ReconcileError> {
        tracing::info!(workflow = name, %status, "status requested");
        self.config
            .call(
                Collaborator::Persistence,
                self.persistence.update_status(name, status),
            )
            .await
            .map_err(|source| ReconcileError::Scheduling {
                workflow: name.to_string(),
                source,
            })
    }

    async fn update_inner(
        &self,
        workflow: &Workflow,
        running: bool,
    ) -> Result<Transition, StepError> {
        match workflow.status {
            WorkflowStatus::Starting | WorkflowStatus::Running => self.run(workflow, running).await,
            WorkflowStatus::Stopping => self.stop(workflow, running).await,
            WorkflowStatus::Suspending | WorkflowStatus::Suspended => {
                self.suspend(workflow, running).await
            }
            WorkflowStatus::Restarting(Some(RestartPhase::Starting)) => {
                self.restart_redeploy(workflow).await
            }
            WorkflowStatus::Restarting(None) => self.restart_undeploy(workflow, running).await,
        }
    }

    async fn run(&self, workflow: &Workflow, running: bool) -> Result<Transition, StepError> {
        if self.coordinator.deploy(workflow, running).await? == Activation::Skipped {
            return Ok(Transition::Idle);
        }
        if workflow.status == WorkflowStatus::Running {
            return Ok(Transition::Unchanged);
        }
        self.record(workflow, WorkflowStatus::Running).await
    }

    async fn stop(&self, workflow: &Workflow, running: bool) -> Result<Transition, StepError> {
        if self.coordinator.undeploy(workflow, running).await? == Activation::Skipped {
            return Ok(Transition::Idle);
        }
        self.config
            .call(
                Collaborator::Persistence,
                self.persistence.delete_workflow(&workflow.name),
            )
            .await?;
        self.config
            .call(
                Collaborator::Persistence,
                self.persistence.reset_workflow(&workflow.name),
            )
            .await?;
        self.publish(Event::unscheduled(workflow)).await;
        Ok(Transition::Deleted)
    }

    async fn suspend(&self, workflow: &Workflow, running: bool) -> Result<Transition, StepError> {
        if self.coordinator.undeploy(workflow, running).await? == Activation::Skipped {
            return Ok(Transition::Idle);
        }
        if workflow.status == WorkflowStatus::Suspended {
            return Ok(Transition::Unchanged);
        }
        self.record(workflow, WorkflowStatus::Suspended).await
    }

    /// Phase 1: take the workflow down and mark the redeploy as pending
    async fn restart_undeploy(
        &self,
        workflow: &Workflow,
        running: bool,
    ) -> Result<Transition, StepError> {
        if self.coordinator.undeploy(workflow, running).await? == Activation::Skipped {
            return Ok(Transition::Idle);
        }
        self.record(
            workflow,
            WorkflowStatus::Restarting(Some(RestartPhase::Starting)),
        )
        .await
    }

    /// Phase 2: phase 1 left nothing active, so deploy unconditionally
    async fn restart_redeploy(&self, workflow: &Workflow) -> Result<Transition, StepError> {
        if self.coordinator.deploy(workflow, false).await? == Activation::Skipped {
            return Ok(Transition::Idle);
        }
        self.record(workflow, WorkflowStatus::Running).await
    }

    /// Persist `status`, then announce it
    async fn record(
        &self,
        workflow: &Workflow,
        status: WorkflowStatus,
    ) -> Result<Transition, StepError> {
        self.config
            .call(
                Collaborator::Persistence,
                self.persistence.update_status(&workflow.name, status),
            )
            .await?;

        let snapshot = workflow.clone().with_status(status);
        let event = match status {
            WorkflowStatus::Running => Event::scheduled(&snapshot),
            _ => Event::unscheduled(&snapshot),
        };
        self.publish(event).await;
        Ok(Transition::Persisted(status))
    }

    /// Fire-and-forget; a stalled bus only loses the notification
    async fn publish(&self, event: Event) {
        let tags = event.tags.clone();
        let publish = self.bus.publish(event, false);
        if tokio::time::timeout(self.config.call_timeout, publish)
            .await
            .is_err()
        {
            tracing::warn!(?tags, "lifecycle event not delivered in time");
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
