// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process workflow driver.
//!
//! Daemon schedules run once when activated and stay active until
//! unscheduled. Time schedules stay active and run whenever their timer
//! fires. Event triggers run once and leave nothing active.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wf_adapters::{DriverAdapter, DriverError, KeyValueAdapter};
use wf_core::{Clock, DeployableWorkflow, Event, Schedule, Workflow};

use crate::store::StorePersistence;
use crate::timers::Timers;

#[derive(Default)]
struct DriverState {
    active: BTreeMap<String, DeployableWorkflow>,
    timers: Timers,
}

#[derive(Clone)]
pub struct LocalDriver<K, C> {
    state: Arc<Mutex<DriverState>>,
    kv: K,
    store: StorePersistence,
    clock: C,
}

impl<K: KeyValueAdapter, C: Clock> LocalDriver<K, C> {
    pub fn new(kv: K, store: StorePersistence, clock: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(DriverState::default())),
            kv,
            store,
            clock,
        }
    }

    /// Run every time-scheduled workflow whose timer is due and re-arm it.
    /// Returns the names that ran.
    pub async fn poll(&self) -> Vec<String> {
        let now = self.clock.utc();
        let due: Vec<DeployableWorkflow> = {
            let mut state = self.lock_state();
            let fired = state.timers.fired_timers(now);
            let mut due = Vec::with_capacity(fired.len());
            for name in fired {
                let Some(deployable) = state.active.get(&name).cloned() else {
                    continue;
                };
                if let Schedule::Time(time) = &deployable.workflow.schedule {
                    match time.next_run(now) {
                        Some(at) => state.timers.set_timer(name.as_str(), at),
                        None => tracing::info!(workflow = %name, "time window closed"),
                    }
                }
                due.push(deployable);
            }
            due
        };

        let mut ran = Vec::with_capacity(due.len());
        for deployable in due {
            match self.run(&deployable, None).await {
                Ok(()) => ran.push(deployable.workflow.name.clone()),
                Err(e) => tracing::error!(
                    workflow = deployable.name(),
                    error = %e,
                    "timed run failed"
                ),
            }
        }
        ran
    }

    /// Execute one run of a workflow
    async fn run(
        &self,
        deployable: &DeployableWorkflow,
        trigger: Option<&Event>,
    ) -> Result<(), DriverError> {
        let workflow = &deployable.workflow;
        let payload = &deployable.breed.deployable;

        let definition = if payload.requires_staging() {
            let path = workflow.staging_path();
            self.kv
                .get(&path)
                .await
                .map_err(|e| DriverError::Unavailable(e.to_string()))?
                .ok_or_else(|| {
                    DriverError::ScheduleFailed(format!("no definition staged at {}", path))
                })?
        } else {
            payload.definition.clone()
        };

        tracing::info!(
            workflow = %workflow.name,
            breed = %deployable.breed.name,
            kind = %payload.kind,
            instances = deployable.scale.as_ref().map(|s| s.instances),
            definition_len = definition.len(),
            trigger = ?trigger.map(|e| &e.tags),
            "running workflow"
        );

        self.store
            .record_run(&workflow.name, self.clock.utc())
            .map_err(|e| DriverError::Unavailable(e.to_string()))
    }

    /// When the next time-scheduled run is due
    pub fn next_timer(&self) -> Option<DateTime<Utc>> {
        self.lock_state().timers.next_deadline()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<K: KeyValueAdapter, C: Clock> DriverAdapter for LocalDriver<K, C> {
    async fn schedule(
        &self,
        workflow: &DeployableWorkflow,
        trigger: Option<&Event>,
    ) -> Result<(), DriverError> {
        if let Some(event) = trigger {
            return self.run(workflow, Some(event)).await;
        }

        let name = workflow.name().to_string();
        match &workflow.workflow.schedule {
            Schedule::Daemon => {
                self.run(workflow, None).await?;
                self.lock_state().active.insert(name, workflow.clone());
                Ok(())
            }
            Schedule::Time(time) => {
                let now = self.clock.utc();
                let mut state = self.lock_state();
                if state.timers.deadline(&name).is_none() {
                    match time.next_run(now) {
                        Some(at) => {
                            tracing::debug!(workflow = %name, next_run = %at, "timer armed");
                            state.timers.set_timer(name.as_str(), at);
                        }
                        None => tracing::info!(workflow = %name, "time window closed"),
                    }
                }
                state.active.insert(name, workflow.clone());
                Ok(())
            }
            Schedule::Event { .. } | Schedule::None => Err(DriverError::ScheduleFailed(format!(
                "{} schedule has no driver activation",
                workflow.workflow.schedule.kind()
            ))),
        }
    }

    async fn unschedule(&self, workflow: &Workflow) -> Result<(), DriverError> {
        let mut state = self.lock_state();
        state.active.remove(&workflow.name);
        state.timers.cancel_timer(&workflow.name);
        Ok(())
    }

    async fn scheduled(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.lock_state().active.keys().cloned().collect())
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
