// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifacts referenced by workflows: breeds (execution units) and scales

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployable kinds whose definition is staged in the key-value store
/// instead of being handed to the driver inline.
pub const WORKFLOW_DEPLOYABLE_KINDS: &[&str] = &["application/javascript", "javascript", "js"];

/// Kind of artifact a workflow can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Breed,
    Scale,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Breed => f.write_str("breed"),
            ArtifactKind::Scale => f.write_str("scale"),
        }
    }
}

/// Payload of an execution unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployable {
    pub kind: String,
    pub definition: String,
}

impl Deployable {
    pub fn new(kind: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            definition: definition.into(),
        }
    }

    /// Whether the driver expects this payload to be staged before scheduling
    pub fn requires_staging(&self) -> bool {
        WORKFLOW_DEPLOYABLE_KINDS
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case(self.kind.trim()))
    }
}

/// Execution unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breed {
    pub name: String,
    pub deployable: Deployable,
}

/// Scaling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub name: String,
    pub cpu: f64,
    pub memory: String,
    pub instances: u32,
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
