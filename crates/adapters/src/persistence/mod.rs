// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable record of workflows and the artifacts they reference

use async_trait::async_trait;
use thiserror::Error;
use wf_core::{ArtifactKind, Breed, Scale, Workflow, WorkflowStatus};

/// Errors from persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{kind} not found: {name}")]
    ArtifactNotFound { kind: ArtifactKind, name: String },
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("storage failed: {0}")]
    Storage(String),
}

/// Adapter for the artifact/persistence store
#[async_trait]
pub trait PersistenceAdapter: Clone + Send + Sync + 'static {
    /// All persisted workflows
    async fn workflows(&self) -> Result<Vec<Workflow>, PersistenceError>;

    /// Record a new status for a workflow
    async fn update_status(
        &self,
        name: &str,
        status: WorkflowStatus,
    ) -> Result<(), PersistenceError>;

    /// Delete a workflow record
    async fn delete_workflow(&self, name: &str) -> Result<(), PersistenceError>;

    /// Clear runtime residue recorded for a workflow
    async fn reset_workflow(&self, name: &str) -> Result<(), PersistenceError>;

    /// Look up a breed by name
    async fn resolve_breed(&self, name: &str) -> Result<Breed, PersistenceError>;

    /// Look up a scale by name
    async fn resolve_scale(&self, name: &str) -> Result<Scale, PersistenceError>;
}
