// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events on the bus and the percolator subscriptions that match them

use crate::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tag marking a workflow that has been activated
pub const SCHEDULED_TAG: &str = "scheduled";
/// Tag marking a workflow that has been deactivated
pub const UNSCHEDULED_TAG: &str = "unscheduled";
/// Event kind for workflow lifecycle events
pub const WORKFLOW_EVENT_KIND: &str = "workflow";

/// A tagged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub value: serde_json::Value,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new<I, S>(tags: I, value: serde_json::Value, kind: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            value,
            kind: kind.into(),
            timestamp: Utc::now(),
        }
    }

    /// Lifecycle event published after a workflow is activated
    pub fn scheduled(workflow: &Workflow) -> Self {
        Self::lifecycle(workflow, SCHEDULED_TAG)
    }

    /// Lifecycle event published after a workflow is deactivated
    pub fn unscheduled(workflow: &Workflow) -> Self {
        Self::lifecycle(workflow, UNSCHEDULED_TAG)
    }

    fn lifecycle(workflow: &Workflow, marker: &str) -> Self {
        let value = serde_json::to_value(workflow).unwrap_or(serde_json::Value::Null);
        Self::new([workflow.tag(), marker.to_string()], value, WORKFLOW_EVENT_KIND)
    }

    /// True if every one of `tags` is carried by this event
    pub fn matches(&self, tags: &BTreeSet<String>) -> bool {
        tags.is_subset(&self.tags)
    }

    /// Copy of this event with the value dropped
    pub fn without_value(&self) -> Self {
        Self {
            value: serde_json::Value::Null,
            ..self.clone()
        }
    }
}

/// Percolator registration: deliver `workflow` when an event carries `tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub tags: BTreeSet<String>,
    pub workflow: Workflow,
}

impl Subscription {
    pub fn for_workflow(workflow: &Workflow, tags: &BTreeSet<String>) -> Self {
        Self {
            name: workflow.subscription_name(),
            tags: tags.clone(),
            workflow: workflow.clone(),
        }
    }
}

/// A subscription that fired, with the event that fired it
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedTrigger {
    pub workflow: Workflow,
    pub event: Event,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
