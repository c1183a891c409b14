// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence adapter backed by the write-ahead log

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wf_adapters::{PersistenceAdapter, PersistenceError};
use wf_core::{ArtifactKind, Breed, Operation, Scale, Workflow, WorkflowStatus};
use wf_storage::{MaterializedState, Wal, WalError};

/// Every write goes to the WAL first, then to the materialized state.
#[derive(Clone)]
pub struct StorePersistence {
    wal: Arc<Mutex<Wal>>,
    state: Arc<Mutex<MaterializedState>>,
}

impl StorePersistence {
    pub fn new(wal: Wal, state: MaterializedState) -> Self {
        Self {
            wal: Arc::new(Mutex::new(wal)),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Durably record an operation and apply it
    pub fn persist(&self, operation: Operation) -> Result<(), WalError> {
        {
            let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
            wal.append(&operation)?;
        }
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.apply(&operation);
        }
        Ok(())
    }

    /// Record that the driver completed a run of `name`
    pub fn record_run(&self, name: &str, at: DateTime<Utc>) -> Result<(), WalError> {
        self.persist(Operation::RunRecorded {
            name: name.to_string(),
            at,
        })
    }

    /// Read from the materialized state
    pub fn read<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    pub fn workflow(&self, name: &str) -> Option<Workflow> {
        self.read(|state| state.workflows.get(name).cloned())
    }

    fn persist_or_storage(&self, operation: Operation) -> Result<(), PersistenceError> {
        self.persist(operation)
            .map_err(|e| PersistenceError::Storage(e.to_string()))
    }
}

#[async_trait]
impl PersistenceAdapter for StorePersistence {
    async fn workflows(&self) -> Result<Vec<Workflow>, PersistenceError> {
        Ok(self.read(|state| state.workflows.values().cloned().collect()))
    }

    async fn update_status(
        &self,
        name: &str,
        status: WorkflowStatus,
    ) -> Result<(), PersistenceError> {
        if self.workflow(name).is_none() {
            return Err(PersistenceError::WorkflowNotFound(name.to_string()));
        }
        self.persist_or_storage(Operation::StatusUpdate {
            name: name.to_string(),
            status,
        })
    }

    async fn delete_workflow(&self, name: &str) -> Result<(), PersistenceError> {
        // Already gone is fine
        if self.workflow(name).is_none() {
            return Ok(());
        }
        self.persist_or_storage(Operation::WorkflowDelete {
            name: name.to_string(),
        })
    }

    async fn reset_workflow(&self, name: &str) -> Result<(), PersistenceError> {
        if !self.read(|state| state.runtime.contains_key(name)) {
            return Ok(());
        }
        self.persist_or_storage(Operation::WorkflowReset {
            name: name.to_string(),
        })
    }

    async fn resolve_breed(&self, name: &str) -> Result<Breed, PersistenceError> {
        self.read(|state| state.breeds.get(name).cloned())
            .ok_or_else(|| PersistenceError::ArtifactNotFound {
                kind: ArtifactKind::Breed,
                name: name.to_string(),
            })
    }

    async fn resolve_scale(&self, name: &str) -> Result<Scale, PersistenceError> {
        self.read(|state| state.scales.get(name).cloned())
            .ok_or_else(|| PersistenceError::ArtifactNotFound {
                kind: ArtifactKind::Scale,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
