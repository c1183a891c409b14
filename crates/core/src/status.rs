// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sub-state of a two-phase restart.
///
/// `Restarting(None)` means the undeploy step is pending;
/// `Restarting(Some(RestartPhase::Starting))` means undeploy is done and the
/// redeploy step is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPhase {
    Starting,
}

/// Current lifecycle state of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Starting,
    Running,
    Stopping,
    Suspending,
    Suspended,
    Restarting(Option<RestartPhase>),
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Starting => "starting",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Stopping => "stopping",
            WorkflowStatus::Suspending => "suspending",
            WorkflowStatus::Suspended => "suspended",
            WorkflowStatus::Restarting(None) => "restarting",
            WorkflowStatus::Restarting(Some(RestartPhase::Starting)) => "restarting/starting",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workflow status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for WorkflowStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starting" => Ok(WorkflowStatus::Starting),
            "running" => Ok(WorkflowStatus::Running),
            "stopping" => Ok(WorkflowStatus::Stopping),
            "suspending" => Ok(WorkflowStatus::Suspending),
            "suspended" => Ok(WorkflowStatus::Suspended),
            "restarting" => Ok(WorkflowStatus::Restarting(None)),
            "restarting/starting" => Ok(WorkflowStatus::Restarting(Some(RestartPhase::Starting))),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
