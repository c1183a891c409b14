// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification sink for reconciliation failures

mod logging;

pub use logging::LogNotifyAdapter;

use async_trait::async_trait;
use std::fmt;

/// Which kind of reconciliation pass failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// A desired-state update pass
    Scheduling,
    /// An event-triggered execution pass
    Execution,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Scheduling => f.write_str("workflow scheduling error"),
            ReportKind::Execution => f.write_str("workflow execution error"),
        }
    }
}

/// External system a reconciliation pass talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    Persistence,
    EventBus,
    KeyValue,
    Driver,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Persistence => f.write_str("persistence"),
            Collaborator::EventBus => f.write_str("event bus"),
            Collaborator::KeyValue => f.write_str("key-value store"),
            Collaborator::Driver => f.write_str("driver"),
        }
    }
}

/// A failure report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub workflow: String,
    /// The collaborator that failed, when the failure came from one
    pub collaborator: Option<Collaborator>,
    pub message: String,
}

/// Adapter for the notification sink. Reporting never fails.
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    async fn report(&self, report: Report);
}
