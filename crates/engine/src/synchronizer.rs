// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic synchronization: persisted state in, update messages out

use crate::{EngineConfig, Message, StepError};
use std::collections::HashSet;
use wf_adapters::{Collaborator, DriverAdapter, EventBusAdapter, PersistenceAdapter};
use wf_core::{Schedule, Workflow};

/// Computes one `Update` per persisted workflow, with the running hint taken
/// from whichever collaborator owns the workflow's activation.
#[derive(Clone)]
pub struct Synchronizer<P, E, D> {
    persistence: P,
    bus: E,
    driver: D,
    config: EngineConfig,
}

impl<P, E, D> Synchronizer<P, E, D>
where
    P: PersistenceAdapter,
    E: EventBusAdapter,
    D: DriverAdapter,
{
    pub fn new(persistence: P, bus: E, driver: D, config: EngineConfig) -> Self {
        Self {
            persistence,
            bus,
            driver,
            config,
        }
    }

    pub async fn tick(&self) -> Result<Vec<Message>, StepError> {
        let (workflows, subscriptions, scheduled) = tokio::try_join!(
            self.config.call(Collaborator::Persistence, self.persistence.workflows()),
            self.config.call(Collaborator::EventBus, self.bus.subscriptions()),
            self.config.call(Collaborator::Driver, self.driver.scheduled()),
        )?;

        let subscriptions: HashSet<String> = subscriptions.into_iter().collect();
        let scheduled: HashSet<String> = scheduled.into_iter().collect();

        let messages: Vec<Message> = workflows
            .into_iter()
            .map(|workflow| {
                let running = is_running(&workflow, &subscriptions, &scheduled);
                Message::update(workflow, running)
            })
            .collect();

        tracing::debug!(workflows = messages.len(), "synchronized");
        Ok(messages)
    }
}

fn is_running(
    workflow: &Workflow,
    subscriptions: &HashSet<String>,
    scheduled: &HashSet<String>,
) -> bool {
    match &workflow.schedule {
        Schedule::Daemon | Schedule::Time(_) => scheduled.contains(&workflow.name),
        Schedule::Event { .. } => subscriptions.contains(&workflow.subscription_name()),
        Schedule::None => false,
    }
}

#[cfg(test)]
#[path = "synchronizer_tests.rs"]
mod tests;
