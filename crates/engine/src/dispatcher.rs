// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workflow serialized dispatch
//!
//! Messages are routed to a fixed pool of workers by a hash of the workflow
//! name. A worker handles one message at a time, so two passes for the same
//! workflow never overlap while different workflows proceed in parallel.

use crate::Message;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Something that consumes reconciler messages
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: Message);
}

#[async_trait]
impl<P, E, K, D, N> MessageHandler for crate::Reconciler<P, E, K, D, N>
where
    P: wf_adapters::PersistenceAdapter,
    E: wf_adapters::EventBusAdapter,
    K: wf_adapters::KeyValueAdapter,
    D: wf_adapters::DriverAdapter,
    N: wf_adapters::NotifyAdapter,
{
    async fn handle(&self, message: Message) {
        crate::Reconciler::handle(self, message).await
    }
}

/// Per workflow, how many updates and status writes are queued or in progress
type Pending = Arc<Mutex<HashMap<String, usize>>>;

pub struct Dispatcher {
    workers: Vec<mpsc::UnboundedSender<Message>>,
    handles: Vec<JoinHandle<()>>,
    pending: Pending,
}

impl Dispatcher {
    /// Spawn `workers` workers (at least one) feeding `handler`
    pub fn spawn<H: MessageHandler>(handler: Arc<H>, workers: usize) -> Self {
        let pending: Pending = Arc::default();
        let (workers, handles): (Vec<_>, Vec<_>) = (0..workers.max(1))
            .map(|index| {
                let (tx, rx) = mpsc::unbounded_channel();
                let handle = tokio::spawn(run_worker(
                    index,
                    Arc::clone(&handler),
                    rx,
                    Arc::clone(&pending),
                ));
                (tx, handle)
            })
            .unzip();

        Self {
            workers,
            handles,
            pending,
        }
    }

    /// Queue a message. Returns false if it was dropped: an update for a
    /// workflow that already has an update or status write pending, a
    /// message with no workflow, or a worker that has gone away.
    pub fn dispatch(&self, message: Message) -> bool {
        let Some(name) = message.workflow_name().map(str::to_string) else {
            tracing::debug!("dropping message without a workflow");
            return false;
        };

        let tracked = message.is_pending_tracked();
        if tracked {
            let mut pending = self.lock_pending();
            let count = pending.entry(name.clone()).or_default();
            if *count > 0 && matches!(message, Message::Update { .. }) {
                tracing::debug!(workflow = %name, "update already pending, coalesced");
                return false;
            }
            *count += 1;
        }

        let index = self.worker_for(&name);
        if self.workers[index].send(message).is_err() {
            tracing::warn!(workflow = %name, worker = index, "worker stopped, message dropped");
            if tracked {
                release(&self.pending, &name);
            }
            return false;
        }
        true
    }

    /// Number of workflows with an update or status write queued or in progress
    pub fn pending(&self) -> usize {
        self.lock_pending().len()
    }

    /// Stop accepting messages and wait for queued ones to finish
    pub async fn shutdown(self) {
        drop(self.workers);
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "dispatcher worker panicked");
            }
        }
    }

    fn worker_for(&self, name: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        (hasher.finish() % self.workers.len() as u64) as usize
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn run_worker<H: MessageHandler>(
    index: usize,
    handler: Arc<H>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    pending: Pending,
) {
    tracing::debug!(worker = index, "dispatcher worker started");
    while let Some(message) = rx.recv().await {
        // Released only after the pass, so ticks arriving mid-pass are
        // dropped rather than replayed against a stale view.
        let name = message.workflow_name().map(str::to_string);
        let tracked = message.is_pending_tracked();

        // A panicking pass takes down its own task, not the worker
        let handler = Arc::clone(&handler);
        if let Err(e) = tokio::spawn(async move { handler.handle(message).await }).await {
            tracing::error!(
                worker = index,
                workflow = ?name,
                error = %e,
                "message handler panicked"
            );
        }

        if let (true, Some(name)) = (tracked, name) {
            release(&pending, &name);
        }
    }
    tracing::debug!(worker = index, "dispatcher worker stopped");
}

fn release(pending: &Pending, name: &str) {
    let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(count) = pending.get_mut(name) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            pending.remove(name);
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
