// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest validation

use crate::{Manifest, ParseError};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use wf_core::{Schedule, Workflow};

/// Shortest period a time schedule may declare
const MIN_PERIOD: Duration = Duration::from_millis(1);

// Names: alphanumeric start, then alphanumerics, '_', '.', or '-'
#[allow(clippy::expect_used)]
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("constant regex pattern is valid")
});

/// True if `name` may be used for a breed, scale, or workflow
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Check names, references, and schedules across the whole manifest
pub fn validate(manifest: &Manifest) -> Result<(), ParseError> {
    let names = manifest
        .breeds
        .keys()
        .map(|n| ("breed", n))
        .chain(manifest.scales.keys().map(|n| ("scale", n)))
        .chain(manifest.workflows.keys().map(|n| ("workflow", n)));
    for (kind, name) in names {
        if !is_valid_name(name) {
            return Err(invalid(format!("{} name '{}' is not allowed", kind, name)));
        }
    }

    for (name, breed) in &manifest.breeds {
        if breed.deployable.kind.trim().is_empty() {
            return Err(invalid(format!("breed.{}.kind is empty", name)));
        }
    }

    for (name, scale) in &manifest.scales {
        if scale.cpu.is_nan() || scale.cpu <= 0.0 {
            return Err(invalid(format!("scale.{}.cpu must be positive", name)));
        }
        if scale.instances == 0 {
            return Err(invalid(format!("scale.{}.instances must be at least 1", name)));
        }
    }

    for workflow in manifest.workflows.values() {
        validate_workflow(manifest, workflow)?;
    }
    Ok(())
}

fn validate_workflow(manifest: &Manifest, workflow: &Workflow) -> Result<(), ParseError> {
    let name = &workflow.name;
    if !manifest.breeds.contains_key(&workflow.breed) {
        return Err(invalid(format!(
            "workflow.{} references unknown breed '{}'",
            name, workflow.breed
        )));
    }
    if let Some(scale) = &workflow.scale {
        if !manifest.scales.contains_key(scale) {
            return Err(invalid(format!(
                "workflow.{} references unknown scale '{}'",
                name, scale
            )));
        }
    }

    match &workflow.schedule {
        Schedule::Event { tags } => {
            if tags.is_empty() {
                return Err(invalid(format!("workflow.{} needs at least one event tag", name)));
            }
            if tags.iter().any(|t| t.trim().is_empty()) {
                return Err(invalid(format!("workflow.{} has an empty event tag", name)));
            }
        }
        Schedule::Time(time) => {
            if time.period.is_zero() {
                return Err(invalid(format!("workflow.{} period must be positive", name)));
            }
            if time.period < MIN_PERIOD {
                return Err(invalid(format!(
                    "workflow.{} period must be at least {:?}",
                    name, MIN_PERIOD
                )));
            }
            if let (Some(start), Some(end)) = (time.start, time.end) {
                if end <= start {
                    return Err(invalid(format!("workflow.{} ends before it starts", name)));
                }
            }
        }
        Schedule::Daemon | Schedule::None => {}
    }
    Ok(())
}

fn invalid(message: String) -> ParseError {
    ParseError::Invalid(message)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
