// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration and the bounded collaborator call

use crate::StepError;
use std::future::Future;
use std::time::Duration;
use wf_adapters::Collaborator;

/// Default limit for a single collaborator call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long one collaborator call may take before the pass fails
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl EngineConfig {
    pub fn with_call_timeout(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    /// Await a collaborator call, failing the step if it errors or runs past
    /// `call_timeout`.
    pub(crate) async fn call<T, E, F>(
        &self,
        collaborator: Collaborator,
        fut: F,
    ) -> Result<T, StepError>
    where
        F: Future<Output = Result<T, E>>,
        StepError: From<E>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result.map_err(StepError::from),
            Err(_) => Err(StepError::CollaboratorUnavailable {
                collaborator,
                message: format!("no answer within {}ms", self.call_timeout.as_millis()),
            }),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
