// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::bus::{BusError, EventBusAdapter};
use crate::driver::{DriverAdapter, DriverError};
use crate::kv::{KeyValueAdapter, KeyValueError};
use async_trait::async_trait;
use tracing::Instrument;
use wf_core::{DeployableWorkflow, Event, KeyPath, Subscription, Workflow};

/// Wrapper that adds tracing to any DriverAdapter
#[derive(Clone)]
pub struct TracedDriverAdapter<D> {
    inner: D,
}

impl<D> TracedDriverAdapter<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: DriverAdapter> DriverAdapter for TracedDriverAdapter<D> {
    async fn schedule(
        &self,
        workflow: &DeployableWorkflow,
        trigger: Option<&Event>,
    ) -> Result<(), DriverError> {
        let span = tracing::info_span!(
            "driver.schedule",
            workflow = workflow.name(),
            breed = %workflow.breed.name,
        );

        async move {
            tracing::info!(
                schedule = workflow.workflow.schedule.kind(),
                triggered = trigger.is_some(),
                "scheduling"
            );

            let start = std::time::Instant::now();
            let result = self.inner.schedule(workflow, trigger).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "scheduled"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "schedule failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn unschedule(&self, workflow: &Workflow) -> Result<(), DriverError> {
        let span = tracing::info_span!("driver.unschedule", workflow = %workflow.name);

        async move {
            let result = self.inner.unschedule(workflow).await;
            // unschedule failing is often acceptable (workflow already gone)
            match &result {
                Ok(()) => tracing::info!("unscheduled"),
                Err(e) => tracing::warn!(error = %e, "unschedule failed (may be expected)"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn scheduled(&self) -> Result<Vec<String>, DriverError> {
        let result = self.inner.scheduled().await;
        tracing::trace!(
            count = result.as_ref().map(|v| v.len()).ok(),
            "listed scheduled workflows"
        );
        result
    }
}

/// Wrapper that adds tracing to any EventBusAdapter
#[derive(Clone)]
pub struct TracedEventBusAdapter<E> {
    inner: E,
}

impl<E> TracedEventBusAdapter<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: EventBusAdapter> EventBusAdapter for TracedEventBusAdapter<E> {
    async fn register(&self, subscription: Subscription) -> Result<(), BusError> {
        let span = tracing::info_span!("bus.register", name = %subscription.name);

        async move {
            tracing::info!(tags = ?subscription.tags, "registering subscription");
            let result = self.inner.register(subscription).await;
            match &result {
                Ok(()) => tracing::info!("registered"),
                Err(e) => tracing::error!(error = %e, "register failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn unregister(&self, name: &str) -> Result<(), BusError> {
        let span = tracing::info_span!("bus.unregister", name);

        async move {
            let result = self.inner.unregister(name).await;
            match &result {
                Ok(()) => tracing::info!("unregistered"),
                Err(e) => tracing::warn!(error = %e, "unregister failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn publish(&self, event: Event, index_value: bool) {
        tracing::debug!(tags = ?event.tags, kind = %event.kind, index_value, "publishing");
        self.inner.publish(event, index_value).await
    }

    async fn subscriptions(&self) -> Result<Vec<String>, BusError> {
        let result = self.inner.subscriptions().await;
        tracing::trace!(
            count = result.as_ref().map(|v| v.len()).ok(),
            "listed subscriptions"
        );
        result
    }
}

/// Wrapper that adds tracing to any KeyValueAdapter
#[derive(Clone)]
pub struct TracedKeyValueAdapter<K> {
    inner: K,
}

impl<K> TracedKeyValueAdapter<K> {
    pub fn new(inner: K) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

#[async_trait]
impl<K: KeyValueAdapter> KeyValueAdapter for TracedKeyValueAdapter<K> {
    async fn set(&self, path: &KeyPath, value: Option<String>) -> Result<(), KeyValueError> {
        let span = tracing::info_span!("kv.set", path = %path);

        async move {
            tracing::debug!(value_len = value.as_ref().map(|v| v.len()), "writing");
            let result = self.inner.set(path, value).await;
            match &result {
                Ok(()) => tracing::debug!("written"),
                Err(e) => tracing::error!(error = %e, "write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, path: &KeyPath) -> Result<Option<String>, KeyValueError> {
        let result = self.inner.get(path).await;
        tracing::trace!(%path, found = ?result.as_ref().map(|v| v.is_some()).ok(), "read");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
