// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapter implementations for testing
//!
//! All fakes share one recorder, so the relative order of calls across
//! collaborators can be asserted.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::bus::{BusError, EventBusAdapter};
use crate::driver::{DriverAdapter, DriverError};
use crate::kv::{KeyValueAdapter, KeyValueError};
use crate::notify::{NotifyAdapter, Report};
use crate::persistence::{PersistenceAdapter, PersistenceError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wf_core::{
    ArtifactKind, Breed, DeployableWorkflow, Event, KeyPath, Scale, Subscription, Workflow,
    WorkflowStatus,
};

/// Recorded call to an adapter method
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    // Persistence calls
    ListWorkflows,
    UpdateStatus {
        name: String,
        status: WorkflowStatus,
    },
    DeleteWorkflow {
        name: String,
    },
    ResetWorkflow {
        name: String,
    },
    ResolveBreed {
        name: String,
    },
    ResolveScale {
        name: String,
    },

    // Event bus calls
    Register {
        name: String,
        tags: BTreeSet<String>,
        workflow: String,
    },
    Unregister {
        name: String,
    },
    Publish {
        tags: BTreeSet<String>,
        index_value: bool,
    },
    ListSubscriptions,

    // Key-value calls
    KvSet {
        path: String,
        value: Option<String>,
    },
    KvGet {
        path: String,
    },

    // Driver calls
    Schedule {
        workflow: String,
        breed: String,
        scale: Option<String>,
        trigger: Option<Event>,
    },
    Unschedule {
        workflow: String,
    },
    ListScheduled,

    // Notify calls
    Report(Report),
}

/// Adapter operation that can be made to fail or stall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    ListWorkflows,
    UpdateStatus,
    DeleteWorkflow,
    ResetWorkflow,
    ResolveBreed,
    ResolveScale,
    Register,
    Unregister,
    ListSubscriptions,
    KvSet,
    Schedule,
    Unschedule,
    ListScheduled,
}

/// Shared state for fake adapters
#[derive(Default)]
struct FakeState {
    calls: Vec<AdapterCall>,
    workflows: BTreeMap<String, Workflow>,
    breeds: HashMap<String, Breed>,
    scales: HashMap<String, Scale>,
    resets: Vec<String>,
    subscriptions: BTreeMap<String, Subscription>,
    published: Vec<Event>,
    kv: BTreeMap<KeyPath, String>,
    scheduled: BTreeSet<String>,
    // Configurable failure modes
    failing: HashSet<FakeOp>,
    delays: HashMap<FakeOp, Duration>,
}

/// Fake adapters with call recording for testing
#[derive(Clone, Default)]
pub struct FakeAdapters {
    state: Arc<Mutex<FakeState>>,
}

impl FakeAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.lock().calls.clone()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Events published to the fake bus
    pub fn published(&self) -> Vec<Event> {
        self.lock().published.clone()
    }

    /// Reports sent to the fake notification sink
    pub fn reports(&self) -> Vec<Report> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                AdapterCall::Report(report) => Some(report.clone()),
                _ => None,
            })
            .collect()
    }

    /// Seed a persisted workflow
    pub fn add_workflow(&self, workflow: Workflow) {
        self.lock()
            .workflows
            .insert(workflow.name.clone(), workflow);
    }

    /// Current persisted copy of a workflow
    pub fn workflow(&self, name: &str) -> Option<Workflow> {
        self.lock().workflows.get(name).cloned()
    }

    /// Seed a breed
    pub fn add_breed(&self, breed: Breed) {
        self.lock().breeds.insert(breed.name.clone(), breed);
    }

    /// Seed a scale
    pub fn add_scale(&self, scale: Scale) {
        self.lock().scales.insert(scale.name.clone(), scale);
    }

    /// Mark a workflow as driver-scheduled without going through `schedule`
    pub fn mark_scheduled(&self, name: &str) {
        self.lock().scheduled.insert(name.to_string());
    }

    /// Names of workflows that have been reset
    pub fn resets(&self) -> Vec<String> {
        self.lock().resets.clone()
    }

    /// Staged value in the fake key-value store
    pub fn kv_value(&self, path: &KeyPath) -> Option<String> {
        self.lock().kv.get(path).cloned()
    }

    /// Configure an operation to fail (or succeed again) for testing error paths
    pub fn set_failing(&self, op: FakeOp, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(op);
        } else {
            state.failing.remove(&op);
        }
    }

    /// Delay an operation before it answers
    pub fn set_delay(&self, op: FakeOp, delay: Duration) {
        self.lock().delays.insert(op, delay);
    }

    /// Get the persistence adapter
    pub fn persistence(&self) -> FakePersistenceAdapter {
        FakePersistenceAdapter {
            fake: self.clone(),
        }
    }

    /// Get the event bus adapter
    pub fn bus(&self) -> FakeEventBusAdapter {
        FakeEventBusAdapter {
            fake: self.clone(),
        }
    }

    /// Get the key-value adapter
    pub fn kv(&self) -> FakeKeyValueAdapter {
        FakeKeyValueAdapter {
            fake: self.clone(),
        }
    }

    /// Get the driver adapter
    pub fn driver(&self) -> FakeDriverAdapter {
        FakeDriverAdapter {
            fake: self.clone(),
        }
    }

    /// Get the notify adapter
    pub fn notify(&self) -> FakeNotifyAdapter {
        FakeNotifyAdapter {
            fake: self.clone(),
        }
    }

    /// Record a call, apply any configured delay, and report whether the
    /// operation is configured to fail.
    async fn enter(&self, op: FakeOp, call: AdapterCall) -> bool {
        let delay = {
            let mut state = self.lock();
            state.calls.push(call);
            state.delays.get(&op).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.lock().failing.contains(&op)
    }
}

// =============================================================================
// Fake Persistence Adapter
// =============================================================================

#[derive(Clone)]
pub struct FakePersistenceAdapter {
    fake: FakeAdapters,
}

#[async_trait]
impl PersistenceAdapter for FakePersistenceAdapter {
    async fn workflows(&self) -> Result<Vec<Workflow>, PersistenceError> {
        if self
            .fake
            .enter(FakeOp::ListWorkflows, AdapterCall::ListWorkflows)
            .await
        {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        Ok(self.fake.lock().workflows.values().cloned().collect())
    }

    async fn update_status(
        &self,
        name: &str,
        status: WorkflowStatus,
    ) -> Result<(), PersistenceError> {
        let call = AdapterCall::UpdateStatus {
            name: name.to_string(),
            status,
        };
        if self.fake.enter(FakeOp::UpdateStatus, call).await {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }

        let mut state = self.fake.lock();
        let workflow = state
            .workflows
            .get_mut(name)
            .ok_or_else(|| PersistenceError::WorkflowNotFound(name.to_string()))?;
        workflow.status = status;
        Ok(())
    }

    async fn delete_workflow(&self, name: &str) -> Result<(), PersistenceError> {
        let call = AdapterCall::DeleteWorkflow {
            name: name.to_string(),
        };
        if self.fake.enter(FakeOp::DeleteWorkflow, call).await {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        self.fake.lock().workflows.remove(name);
        Ok(())
    }

    async fn reset_workflow(&self, name: &str) -> Result<(), PersistenceError> {
        let call = AdapterCall::ResetWorkflow {
            name: name.to_string(),
        };
        if self.fake.enter(FakeOp::ResetWorkflow, call).await {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        self.fake.lock().resets.push(name.to_string());
        Ok(())
    }

    async fn resolve_breed(&self, name: &str) -> Result<Breed, PersistenceError> {
        let call = AdapterCall::ResolveBreed {
            name: name.to_string(),
        };
        if self.fake.enter(FakeOp::ResolveBreed, call).await {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        self.fake
            .lock()
            .breeds
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::ArtifactNotFound {
                kind: ArtifactKind::Breed,
                name: name.to_string(),
            })
    }

    async fn resolve_scale(&self, name: &str) -> Result<Scale, PersistenceError> {
        let call = AdapterCall::ResolveScale {
            name: name.to_string(),
        };
        if self.fake.enter(FakeOp::ResolveScale, call).await {
            return Err(PersistenceError::Storage("configured to fail".to_string()));
        }
        self.fake
            .lock()
            .scales
            .get(name)
            .cloned()
            .ok_or_else(|| PersistenceError::ArtifactNotFound {
                kind: ArtifactKind::Scale,
                name: name.to_string(),
            })
    }
}

// =============================================================================
// Fake Event Bus Adapter
// =============================================================================

#[derive(Clone)]
pub struct FakeEventBusAdapter {
    fake: FakeAdapters,
}

#[async_trait]
impl EventBusAdapter for FakeEventBusAdapter {
    async fn register(&self, subscription: Subscription) -> Result<(), BusError> {
        let call = AdapterCall::Register {
            name: subscription.name.clone(),
            tags: subscription.tags.clone(),
            workflow: subscription.workflow.name.clone(),
        };
        if self.fake.enter(FakeOp::Register, call).await {
            return Err(BusError::Unavailable("configured to fail".to_string()));
        }
        self.fake
            .lock()
            .subscriptions
            .insert(subscription.name.clone(), subscription);
        Ok(())
    }

    async fn unregister(&self, name: &str) -> Result<(), BusError> {
        let call = AdapterCall::Unregister {
            name: name.to_string(),
        };
        if self.fake.enter(FakeOp::Unregister, call).await {
            return Err(BusError::Unavailable("configured to fail".to_string()));
        }
        self.fake.lock().subscriptions.remove(name);
        Ok(())
    }

    async fn publish(&self, event: Event, index_value: bool) {
        let mut state = self.fake.lock();
        state.calls.push(AdapterCall::Publish {
            tags: event.tags.clone(),
            index_value,
        });
        state.published.push(event);
    }

    async fn subscriptions(&self) -> Result<Vec<String>, BusError> {
        if self
            .fake
            .enter(FakeOp::ListSubscriptions, AdapterCall::ListSubscriptions)
            .await
        {
            return Err(BusError::Unavailable("configured to fail".to_string()));
        }
        Ok(self.fake.lock().subscriptions.keys().cloned().collect())
    }
}

// =============================================================================
// Fake Key-Value Adapter
// =============================================================================

#[derive(Clone)]
pub struct FakeKeyValueAdapter {
    fake: FakeAdapters,
}

#[async_trait]
impl KeyValueAdapter for FakeKeyValueAdapter {
    async fn set(&self, path: &KeyPath, value: Option<String>) -> Result<(), KeyValueError> {
        let call = AdapterCall::KvSet {
            path: path.to_string(),
            value: value.clone(),
        };
        if self.fake.enter(FakeOp::KvSet, call).await {
            return Err(KeyValueError::Unavailable("configured to fail".to_string()));
        }

        let mut state = self.fake.lock();
        match value {
            Some(value) => {
                state.kv.insert(path.clone(), value);
            }
            None => {
                state.kv.remove(path);
            }
        }
        Ok(())
    }

    async fn get(&self, path: &KeyPath) -> Result<Option<String>, KeyValueError> {
        let mut state = self.fake.lock();
        state.calls.push(AdapterCall::KvGet {
            path: path.to_string(),
        });
        Ok(state.kv.get(path).cloned())
    }
}

// =============================================================================
// Fake Driver Adapter
// =============================================================================

#[derive(Clone)]
pub struct FakeDriverAdapter {
    fake: FakeAdapters,
}

#[async_trait]
impl DriverAdapter for FakeDriverAdapter {
    async fn schedule(
        &self,
        workflow: &DeployableWorkflow,
        trigger: Option<&Event>,
    ) -> Result<(), DriverError> {
        let call = AdapterCall::Schedule {
            workflow: workflow.name().to_string(),
            breed: workflow.breed.name.clone(),
            scale: workflow.scale.as_ref().map(|s| s.name.clone()),
            trigger: trigger.cloned(),
        };
        if self.fake.enter(FakeOp::Schedule, call).await {
            return Err(DriverError::ScheduleFailed("configured to fail".to_string()));
        }
        if workflow.workflow.schedule.is_driver_managed() {
            self.fake
                .lock()
                .scheduled
                .insert(workflow.name().to_string());
        }
        Ok(())
    }

    async fn unschedule(&self, workflow: &Workflow) -> Result<(), DriverError> {
        let call = AdapterCall::Unschedule {
            workflow: workflow.name.clone(),
        };
        if self.fake.enter(FakeOp::Unschedule, call).await {
            return Err(DriverError::UnscheduleFailed(
                "configured to fail".to_string(),
            ));
        }
        self.fake.lock().scheduled.remove(&workflow.name);
        Ok(())
    }

    async fn scheduled(&self) -> Result<Vec<String>, DriverError> {
        if self
            .fake
            .enter(FakeOp::ListScheduled, AdapterCall::ListScheduled)
            .await
        {
            return Err(DriverError::Unavailable("configured to fail".to_string()));
        }
        Ok(self.fake.lock().scheduled.iter().cloned().collect())
    }
}

// =============================================================================
// Fake Notify Adapter
// =============================================================================

#[derive(Clone)]
pub struct FakeNotifyAdapter {
    fake: FakeAdapters,
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn report(&self, report: Report) {
        self.fake.lock().calls.push(AdapterCall::Report(report));
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
