// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapter that writes reports to the log

use super::{NotifyAdapter, Report};
use async_trait::async_trait;

/// Sends every report to `tracing` at error level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifyAdapter;

impl LogNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for LogNotifyAdapter {
    async fn report(&self, report: Report) {
        match report.collaborator {
            Some(collaborator) => tracing::error!(
                workflow = %report.workflow,
                collaborator = %collaborator,
                "{}: {}",
                report.kind,
                report.message
            ),
            None => tracing::error!(
                workflow = %report.workflow,
                "{}: {}",
                report.kind,
                report.message
            ),
        }
    }
}
