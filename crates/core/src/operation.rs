// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::{Breed, Scale, Workflow, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Create or replace a workflow declaration
    WorkflowPut { workflow: Workflow },

    /// Record a status transition
    StatusUpdate { name: String, status: WorkflowStatus },

    /// Remove a workflow and everything recorded about it
    WorkflowDelete { name: String },

    /// Clear driver-side runtime state for a workflow
    WorkflowReset { name: String },

    /// Create or replace a breed
    BreedPut { breed: Breed },

    /// Create or replace a scale
    ScalePut { scale: Scale },

    /// A driver run of a workflow completed
    RunRecorded { name: String, at: DateTime<Utc> },
}

impl Operation {
    /// Name of the entity this operation touches
    pub fn subject(&self) -> &str {
        match self {
            Operation::WorkflowPut { workflow } => &workflow.name,
            Operation::StatusUpdate { name, .. }
            | Operation::WorkflowDelete { name }
            | Operation::WorkflowReset { name }
            | Operation::RunRecorded { name, .. } => name,
            Operation::BreedPut { breed } => &breed.name,
            Operation::ScalePut { scale } => &scale.name,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
