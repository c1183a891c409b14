// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definitions and the names derived from them

use crate::{Breed, Scale, Schedule, WorkflowStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of percolator subscription names
pub const SUBSCRIPTION_SCHEME: &str = "workflow://";

/// Root segment of staged workflow definitions in the key-value store
pub const STAGING_ROOT: &str = "workflows";

/// A named unit of work with a schedule and a lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    /// Name of the breed (execution unit) to run
    pub breed: String,
    /// Name of the scaling policy, if any
    #[serde(default)]
    pub scale: Option<String>,
    pub schedule: Schedule,
    pub status: WorkflowStatus,
}

impl Workflow {
    pub fn new(name: impl Into<String>, breed: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            name: name.into(),
            breed: breed.into(),
            scale: None,
            schedule,
            status: WorkflowStatus::Starting,
        }
    }

    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = Some(scale.into());
        self
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.status = status;
        self
    }

    /// Name of the percolator subscription for this workflow
    pub fn subscription_name(&self) -> String {
        format!("{}{}", SUBSCRIPTION_SCHEME, self.name)
    }

    /// Key-value path where this workflow's definition is staged
    pub fn staging_path(&self) -> KeyPath {
        KeyPath::new([STAGING_ROOT, self.name.as_str()])
    }

    /// Event tag identifying this workflow
    pub fn tag(&self) -> String {
        format!("{}:{}", STAGING_ROOT, self.name)
    }
}

/// A workflow with its referenced artifacts resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployableWorkflow {
    pub workflow: Workflow,
    pub breed: Breed,
    pub scale: Option<Scale>,
}

impl DeployableWorkflow {
    pub fn name(&self) -> &str {
        &self.workflow.name
    }
}

/// Hierarchical key in the key-value store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
