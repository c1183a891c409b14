// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus with a percolator registry

use super::{BusError, EventBusAdapter};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use wf_core::{Event, MatchedTrigger, Subscription};

#[derive(Default)]
struct BusState {
    subscriptions: BTreeMap<String, Subscription>,
    history: VecDeque<Event>,
}

/// Event bus that matches published events against registered subscriptions
/// and delivers the matches on a channel.
#[derive(Clone)]
pub struct LocalEventBus {
    state: Arc<Mutex<BusState>>,
    matches: mpsc::UnboundedSender<MatchedTrigger>,
    history_limit: usize,
}

impl LocalEventBus {
    /// Create a bus and the receiver its matched triggers are delivered to
    pub fn new(history_limit: usize) -> (Self, mpsc::UnboundedReceiver<MatchedTrigger>) {
        let (matches, rx) = mpsc::unbounded_channel();
        let bus = Self {
            state: Arc::new(Mutex::new(BusState::default())),
            matches,
            history_limit,
        };
        (bus, rx)
    }

    /// Most recently published events, oldest first
    pub fn history(&self) -> Vec<Event> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.history.iter().cloned().collect()
    }
}

#[async_trait]
impl EventBusAdapter for LocalEventBus {
    async fn register(&self, subscription: Subscription) -> Result<(), BusError> {
        if subscription.name.is_empty() {
            return Err(BusError::Rejected("subscription name is empty".to_string()));
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .subscriptions
            .insert(subscription.name.clone(), subscription);
        Ok(())
    }

    async fn unregister(&self, name: &str) -> Result<(), BusError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.subscriptions.remove(name);
        Ok(())
    }

    async fn publish(&self, event: Event, index_value: bool) {
        let matched: Vec<MatchedTrigger> = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

            let indexed = if index_value {
                event.clone()
            } else {
                event.without_value()
            };
            state.history.push_back(indexed);
            while state.history.len() > self.history_limit {
                state.history.pop_front();
            }

            state
                .subscriptions
                .values()
                .filter(|s| event.matches(&s.tags))
                .map(|s| MatchedTrigger {
                    workflow: s.workflow.clone(),
                    event: event.clone(),
                })
                .collect()
        };

        for trigger in matched {
            tracing::debug!(workflow = %trigger.workflow.name, "subscription matched");
            if self.matches.send(trigger).is_err() {
                tracing::warn!("trigger receiver dropped, match discarded");
            }
        }
    }

    async fn subscriptions(&self) -> Result<Vec<String>, BusError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.subscriptions.keys().cloned().collect())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
