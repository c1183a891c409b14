// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger resolver: artifacts in, driver schedule out

use crate::{EngineConfig, StepError};
use wf_adapters::{Collaborator, DriverAdapter, KeyValueAdapter, PersistenceAdapter};
use wf_core::{DeployableWorkflow, Event, Workflow};

/// Resolves a workflow's breed and scale, stages the breed's definition when
/// its kind calls for it, and hands the result to the driver.
#[derive(Clone)]
pub struct TriggerResolver<P, K, D> {
    persistence: P,
    kv: K,
    driver: D,
    config: EngineConfig,
}

impl<P, K, D> TriggerResolver<P, K, D>
where
    P: PersistenceAdapter,
    K: KeyValueAdapter,
    D: DriverAdapter,
{
    pub fn new(persistence: P, kv: K, driver: D, config: EngineConfig) -> Self {
        Self {
            persistence,
            kv,
            driver,
            config,
        }
    }

    /// Schedule `workflow` with the driver, carrying `event` when this is an
    /// event-triggered execution.
    pub async fn trigger(
        &self,
        workflow: &Workflow,
        event: Option<&Event>,
    ) -> Result<(), StepError> {
        let deployable = self.resolve(workflow).await?;

        // The driver may read the staged value while it runs, so the write
        // has to be acknowledged first.
        if deployable.breed.deployable.requires_staging() {
            let definition = deployable.breed.deployable.definition.clone();
            self.config
                .call(
                    Collaborator::KeyValue,
                    self.kv.set(&workflow.staging_path(), Some(definition)),
                )
                .await?;
        }

        self.config
            .call(Collaborator::Driver, self.driver.schedule(&deployable, event))
            .await
    }

    /// Look up the breed and (optional) scale concurrently
    pub async fn resolve(&self, workflow: &Workflow) -> Result<DeployableWorkflow, StepError> {
        let breed = self.config.call(
            Collaborator::Persistence,
            self.persistence.resolve_breed(&workflow.breed),
        );
        let scale = async {
            match &workflow.scale {
                Some(name) => self
                    .config
                    .call(Collaborator::Persistence, self.persistence.resolve_scale(name))
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };

        let (breed, scale) = tokio::try_join!(breed, scale)?;
        Ok(DeployableWorkflow {
            workflow: workflow.clone(),
            breed,
            scale,
        })
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
