// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activation strategies for workflows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// How a workflow gets activated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Always on; the driver keeps it running
    Daemon,
    /// Periodic activation managed by the driver
    Time(TimeSchedule),
    /// Activation when a published event carries all of `tags`
    Event { tags: BTreeSet<String> },
    /// Never activates
    None,
}

impl Schedule {
    /// Shorthand for an event schedule
    pub fn event<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schedule::Event {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// True for schedules whose activation is owned by the driver
    pub fn is_driver_managed(&self) -> bool {
        matches!(self, Schedule::Daemon | Schedule::Time(_))
    }

    /// Short name used in logs and listings
    pub fn kind(&self) -> &'static str {
        match self {
            Schedule::Daemon => "daemon",
            Schedule::Time(_) => "time",
            Schedule::Event { .. } => "event",
            Schedule::None => "none",
        }
    }
}

/// Timer-driven activation window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSchedule {
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeSchedule {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            start: None,
            end: None,
        }
    }

    /// Next activation strictly after `after`.
    ///
    /// Runs are anchored at `start` and repeat every `period`. Without a start,
    /// the first run is one period after `after`. Returns `None` once the next
    /// run would fall past `end`, or when the period is zero.
    pub fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let period = chrono::Duration::from_std(self.period).ok()?;
        if period <= chrono::Duration::zero() {
            return None;
        }

        let next = match self.start {
            Some(start) if after < start => start,
            Some(start) => {
                let elapsed = (after - start).to_std().ok()?.as_nanos();
                let step = self.period.as_nanos();
                let periods = elapsed.checked_div(step)? + 1;
                let offset = i64::try_from(periods.checked_mul(step)?).ok()?;
                start.checked_add_signed(chrono::Duration::nanoseconds(offset))?
            }
            None => after + period,
        };

        match self.end {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
