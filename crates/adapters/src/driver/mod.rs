// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow drivers: turn a scheduling decision into execution

use async_trait::async_trait;
use thiserror::Error;
use wf_core::{DeployableWorkflow, Event, Workflow};

/// Errors from driver operations
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("schedule failed: {0}")]
    ScheduleFailed(String),
    #[error("unschedule failed: {0}")]
    UnscheduleFailed(String),
    #[error("driver unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for the workflow/container driver
#[async_trait]
pub trait DriverAdapter: Clone + Send + Sync + 'static {
    /// Start (or run once, for event triggers) a workflow with its artifacts resolved
    async fn schedule(
        &self,
        workflow: &DeployableWorkflow,
        trigger: Option<&Event>,
    ) -> Result<(), DriverError>;

    /// Stop a driver-managed workflow
    async fn unschedule(&self, workflow: &Workflow) -> Result<(), DriverError>;

    /// Names of workflows whose activation the driver currently owns
    async fn scheduled(&self) -> Result<Vec<String>, DriverError>;
}
