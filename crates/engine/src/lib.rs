// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Workflow reconciliation engine
//!
//! The [`Reconciler`] drives each workflow's runtime state toward its
//! declared status. The [`Dispatcher`] serializes passes per workflow and the
//! [`Synchronizer`] turns persisted state into periodic update messages.

mod config;
mod coordinator;
mod dispatcher;
mod error;
mod message;
mod reconciler;
mod resolver;
mod synchronizer;

#[cfg(test)]
mod test_helpers;

pub use config::EngineConfig;
pub use coordinator::{Activation, Coordinator};
pub use dispatcher::{Dispatcher, MessageHandler};
pub use error::{ReconcileError, StepError};
pub use message::Message;
pub use reconciler::{Reconciler, ReconcilerDeps, Transition};
pub use resolver::TriggerResolver;
pub use synchronizer::Synchronizer;
