// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound messages for the reconciler

use serde::{Deserialize, Serialize};
use wf_core::{Event, MatchedTrigger, Workflow, WorkflowStatus};

/// A unit of work for the reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Bring the workflow's runtime state in line with its declared status.
    /// `running` is the caller's hint that activation is already engaged.
    Update { workflow: Workflow, running: bool },
    /// An event-scheduled workflow's trigger fired; execute it once
    Trigger { workflow: Workflow, event: Event },
    /// Record a status requested from outside, in order with the workflow's
    /// passes
    SetStatus { name: String, status: WorkflowStatus },
    /// Any shape this build does not understand
    #[serde(other)]
    Unknown,
}

impl Message {
    pub fn update(workflow: Workflow, running: bool) -> Self {
        Message::Update { workflow, running }
    }

    pub fn workflow_name(&self) -> Option<&str> {
        match self {
            Message::Update { workflow, .. } | Message::Trigger { workflow, .. } => {
                Some(&workflow.name)
            }
            Message::SetStatus { name, .. } => Some(name),
            Message::Unknown => None,
        }
    }

    /// Updates and status writes hold the workflow's pending mark until they
    /// are processed; triggers do not
    pub(crate) fn is_pending_tracked(&self) -> bool {
        matches!(self, Message::Update { .. } | Message::SetStatus { .. })
    }
}

impl From<MatchedTrigger> for Message {
    fn from(matched: MatchedTrigger) -> Self {
        Message::Trigger {
            workflow: matched.workflow,
            event: matched.event,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
