// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use wf_core::{Breed, Operation, Scale, Workflow};

/// Driver-side residue for one workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeRecord {
    pub runs: u64,
    pub last_run: Option<DateTime<Utc>>,
}

/// Materialized state built from WAL operations
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub workflows: BTreeMap<String, Workflow>,
    pub breeds: BTreeMap<String, Breed>,
    pub scales: BTreeMap<String, Scale>,
    pub runtime: BTreeMap<String, RuntimeRecord>,
}

impl MaterializedState {
    /// Rebuild state from a sequence of operations
    pub fn replay<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::WorkflowPut { workflow } => {
                self.workflows.insert(workflow.name.clone(), workflow.clone());
            }

            Operation::StatusUpdate { name, status } => {
                if let Some(workflow) = self.workflows.get_mut(name) {
                    workflow.status = *status;
                }
            }

            Operation::WorkflowDelete { name } => {
                self.workflows.remove(name);
                self.runtime.remove(name);
            }

            Operation::WorkflowReset { name } => {
                self.runtime.remove(name);
            }

            Operation::BreedPut { breed } => {
                self.breeds.insert(breed.name.clone(), breed.clone());
            }

            Operation::ScalePut { scale } => {
                self.scales.insert(scale.name.clone(), scale.clone());
            }

            Operation::RunRecorded { name, at } => {
                // Runs landing after a delete are dropped
                if self.workflows.contains_key(name) {
                    let record = self.runtime.entry(name.clone()).or_default();
                    record.runs += 1;
                    record.last_run = Some(*at);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
