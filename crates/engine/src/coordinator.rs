// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy/undeploy coordinator
//!
//! Daemon and time schedules are activated by the driver; event schedules
//! by a percolator subscription on the bus. Both are hidden behind
//! [`Coordinator::deploy`] and [`Coordinator::undeploy`], which answer
//! whether the caller should go on to record the transition.

use crate::{EngineConfig, StepError, TriggerResolver};
use wf_adapters::{
    Collaborator, DriverAdapter, EventBusAdapter, KeyValueAdapter, PersistenceAdapter,
};
use wf_core::{Schedule, Subscription, Workflow};

/// Outcome of a deploy or undeploy request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The activation side effect was accepted; continue the pass
    Proceed,
    /// Nothing to activate (schedule `None`); the pass ends here
    Skipped,
}

#[derive(Clone)]
pub struct Coordinator<P, E, K, D> {
    resolver: TriggerResolver<P, K, D>,
    bus: E,
    driver: D,
    config: EngineConfig,
}

impl<P, E, K, D> Coordinator<P, E, K, D>
where
    P: PersistenceAdapter,
    E: EventBusAdapter,
    K: KeyValueAdapter,
    D: DriverAdapter,
{
    pub fn new(persistence: P, bus: E, kv: K, driver: D, config: EngineConfig) -> Self {
        Self {
            resolver: TriggerResolver::new(persistence, kv, driver.clone(), config),
            bus,
            driver,
            config,
        }
    }

    pub fn resolver(&self) -> &TriggerResolver<P, K, D> {
        &self.resolver
    }

    /// Engage the workflow's activation mechanism unless it already is
    pub async fn deploy(
        &self,
        workflow: &Workflow,
        running: bool,
    ) -> Result<Activation, StepError> {
        if running {
            return Ok(Activation::Proceed);
        }

        match &workflow.schedule {
            Schedule::Daemon | Schedule::Time(_) => {
                self.resolver.trigger(workflow, None).await?;
                Ok(Activation::Proceed)
            }
            Schedule::Event { tags } => {
                let subscription = Subscription::for_workflow(workflow, tags);
                self.config
                    .call(Collaborator::EventBus, self.bus.register(subscription))
                    .await?;
                Ok(Activation::Proceed)
            }
            Schedule::None => Ok(Activation::Skipped),
        }
    }

    /// Disengage the workflow's activation mechanism
    pub async fn undeploy(
        &self,
        workflow: &Workflow,
        running: bool,
    ) -> Result<Activation, StepError> {
        match &workflow.schedule {
            Schedule::Daemon | Schedule::Time(_) => {
                if running {
                    // Proceed once the request has been answered; a refusal
                    // does not hold up the transition.
                    let result = self
                        .config
                        .call(Collaborator::Driver, self.driver.unschedule(workflow))
                        .await;
                    if let Err(e) = result {
                        tracing::warn!(
                            workflow = %workflow.name,
                            error = %e,
                            "unschedule not confirmed, continuing"
                        );
                    }
                }
                Ok(Activation::Proceed)
            }
            Schedule::Event { .. } => {
                self.config
                    .call(
                        Collaborator::EventBus,
                        self.bus.unregister(&workflow.subscription_name()),
                    )
                    .await?;
                Ok(Activation::Proceed)
            }
            Schedule::None => Ok(Activation::Skipped),
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
