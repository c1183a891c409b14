// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus and percolator subscription registry

mod local;

pub use local::LocalEventBus;

use async_trait::async_trait;
use thiserror::Error;
use wf_core::{Event, Subscription};

/// Errors from event bus operations
#[derive(Debug, Error)]
pub enum BusError {
    #[error("subscription rejected: {0}")]
    Rejected(String),
    #[error("event bus unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for the event bus
#[async_trait]
pub trait EventBusAdapter: Clone + Send + Sync + 'static {
    /// Register (or replace) a percolator subscription
    async fn register(&self, subscription: Subscription) -> Result<(), BusError>;

    /// Remove a percolator subscription; unknown names are not an error
    async fn unregister(&self, name: &str) -> Result<(), BusError>;

    /// Publish an event. Fire-and-forget.
    ///
    /// With `index_value` false only the tags are meaningful to subscribers;
    /// the value is not indexed.
    async fn publish(&self, event: Event, index_value: bool);

    /// Names of the currently registered subscriptions
    async fn subscriptions(&self) -> Result<Vec<String>, BusError>;
}
