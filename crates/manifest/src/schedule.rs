// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule declarations
//!
//! ```toml
//! schedule = "daemon"                    # or "none"
//! schedule = { event = ["deploy-now"] }
//! schedule = { period = "1h", start = "2026-01-01T00:00:00Z" }
//! ```

use crate::ParseError;
use chrono::{DateTime, Utc};
use wf_core::{Schedule, TimeSchedule};

/// Parse the `schedule` value of `workflow.<name>`
pub fn parse_schedule(name: &str, value: &toml::Value) -> Result<Schedule, ParseError> {
    let field = format!("workflow.{}.schedule", name);

    if let Some(word) = value.as_str() {
        return match word.trim().to_ascii_lowercase().as_str() {
            "daemon" => Ok(Schedule::Daemon),
            "none" => Ok(Schedule::None),
            other => Err(ParseError::InvalidFormat(format!(
                "{}: unknown schedule '{}'",
                field, other
            ))),
        };
    }

    let table = value.as_table().ok_or_else(|| {
        ParseError::InvalidFormat(format!("{} must be a string or a table", field))
    })?;

    match (table.get("event"), table.get("period")) {
        (Some(_), Some(_)) => Err(ParseError::InvalidFormat(format!(
            "{}: event and period are exclusive",
            field
        ))),
        (Some(tags), None) => {
            let tags = tags
                .as_array()
                .ok_or_else(|| {
                    ParseError::InvalidFormat(format!("{}.event must be an array", field))
                })?
                .iter()
                .map(|tag| {
                    tag.as_str().map(str::to_string).ok_or_else(|| {
                        ParseError::InvalidFormat(format!("{}.event: tags are strings", field))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Schedule::event(tags))
        }
        (None, Some(period)) => {
            let period = period.as_str().ok_or_else(|| {
                ParseError::InvalidFormat(format!("{}.period must be a duration string", field))
            })?;
            let period = humantime::parse_duration(period)
                .map_err(|e| ParseError::InvalidFormat(format!("{}.period: {}", field, e)))?;
            Ok(Schedule::Time(TimeSchedule {
                period,
                start: parse_instant(&field, "start", table.get("start"))?,
                end: parse_instant(&field, "end", table.get("end"))?,
            }))
        }
        (None, None) => Err(ParseError::MissingField(format!(
            "{}.event or {}.period",
            field, field
        ))),
    }
}

/// Accepts both TOML datetimes and RFC 3339 strings
fn parse_instant(
    field: &str,
    key: &str,
    value: Option<&toml::Value>,
) -> Result<Option<DateTime<Utc>>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let text = match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Datetime(dt) => dt.to_string(),
        _ => {
            return Err(ParseError::InvalidFormat(format!(
                "{}.{} must be a timestamp",
                field, key
            )))
        }
    };
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| ParseError::InvalidFormat(format!("{}.{}: {}", field, key, e)))
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
