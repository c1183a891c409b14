// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for reconciliation passes

use thiserror::Error;
use wf_adapters::{
    BusError, Collaborator, DriverError, KeyValueError, PersistenceError, Report, ReportKind,
};
use wf_core::ArtifactKind;

/// Failure of a single step inside a reconciliation pass
#[derive(Debug, Error)]
pub enum StepError {
    #[error("{kind} not found: {name}")]
    ArtifactNotFound { kind: ArtifactKind, name: String },
    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        message: String,
    },
}

impl StepError {
    /// The collaborator the failure came from
    pub fn collaborator(&self) -> Collaborator {
        match self {
            StepError::ArtifactNotFound { .. } => Collaborator::Persistence,
            StepError::CollaboratorUnavailable { collaborator, .. } => *collaborator,
        }
    }

    fn unavailable(collaborator: Collaborator, err: impl ToString) -> Self {
        StepError::CollaboratorUnavailable {
            collaborator,
            message: err.to_string(),
        }
    }
}

impl From<PersistenceError> for StepError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::ArtifactNotFound { kind, name } => {
                StepError::ArtifactNotFound { kind, name }
            }
            other => StepError::unavailable(Collaborator::Persistence, other),
        }
    }
}

impl From<BusError> for StepError {
    fn from(err: BusError) -> Self {
        StepError::unavailable(Collaborator::EventBus, err)
    }
}

impl From<KeyValueError> for StepError {
    fn from(err: KeyValueError) -> Self {
        StepError::unavailable(Collaborator::KeyValue, err)
    }
}

impl From<DriverError> for StepError {
    fn from(err: DriverError) -> Self {
        StepError::unavailable(Collaborator::Driver, err)
    }
}

/// Failure of a whole pass, caught at the message boundary
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An update pass failed
    #[error("workflow scheduling error for {workflow}: {source}")]
    Scheduling {
        workflow: String,
        #[source]
        source: StepError,
    },
    /// A triggered execution failed
    #[error("workflow execution error for {workflow}: {source}")]
    Execution {
        workflow: String,
        #[source]
        source: StepError,
    },
}

impl ReconcileError {
    pub fn workflow(&self) -> &str {
        match self {
            ReconcileError::Scheduling { workflow, .. }
            | ReconcileError::Execution { workflow, .. } => workflow,
        }
    }

    pub fn step(&self) -> &StepError {
        match self {
            ReconcileError::Scheduling { source, .. }
            | ReconcileError::Execution { source, .. } => source,
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            ReconcileError::Scheduling { .. } => ReportKind::Scheduling,
            ReconcileError::Execution { .. } => ReportKind::Execution,
        }
    }

    /// Notification for the sink
    pub fn report(&self) -> Report {
        Report {
            kind: self.kind(),
            workflow: self.workflow().to_string(),
            collaborator: Some(self.step().collaborator()),
            message: self.step().to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
