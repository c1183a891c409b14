// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock timers for time-scheduled workflows

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One pending deadline per workflow name
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: HashMap<String, DateTime<Utc>>,
}

impl Timers {
    /// Set (or move) the timer for `id`
    pub fn set_timer(&mut self, id: impl Into<String>, at: DateTime<Utc>) {
        self.deadlines.insert(id.into(), at);
    }

    pub fn cancel_timer(&mut self, id: &str) {
        self.deadlines.remove(id);
    }

    pub fn deadline(&self, id: &str) -> Option<DateTime<Utc>> {
        self.deadlines.get(id).copied()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn fired_timers(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let mut fired: Vec<(DateTime<Utc>, String)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (*at, id.clone()))
            .collect();
        fired.sort();

        for (_, id) in &fired {
            self.deadlines.remove(id);
        }
        fired.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
