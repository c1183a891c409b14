// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest TOML parsing

use crate::parse_schedule;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wf_core::{Breed, Deployable, Scale, Workflow, WorkflowStatus};

/// Errors that can occur during manifest parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("{kind} '{name}' declared twice")]
    Duplicate { kind: &'static str, name: String },
    #[error("invalid manifest: {0}")]
    Invalid(String),
    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<ParseError>,
    },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Declared breeds, scales, and workflows
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub breeds: BTreeMap<String, Breed>,
    pub scales: BTreeMap<String, Scale>,
    pub workflows: BTreeMap<String, Workflow>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.breeds.is_empty() && self.scales.is_empty() && self.workflows.is_empty()
    }

    /// Fold another manifest into this one; a name may only be declared once
    pub fn merge(&mut self, other: Manifest) -> Result<(), ParseError> {
        merge_into(&mut self.breeds, other.breeds, "breed")?;
        merge_into(&mut self.scales, other.scales, "scale")?;
        merge_into(&mut self.workflows, other.workflows, "workflow")?;
        Ok(())
    }
}

fn merge_into<T>(
    target: &mut BTreeMap<String, T>,
    source: BTreeMap<String, T>,
    kind: &'static str,
) -> Result<(), ParseError> {
    for (name, item) in source {
        if target.contains_key(&name) {
            return Err(ParseError::Duplicate { kind, name });
        }
        target.insert(name, item);
    }
    Ok(())
}

/// Parse a manifest from TOML content (not yet validated)
pub fn parse_manifest(content: &str) -> Result<Manifest, ParseError> {
    let raw: toml::Value = toml::from_str(content)?;
    let table = raw
        .as_table()
        .ok_or_else(|| ParseError::InvalidFormat("root must be a table".to_string()))?;

    let mut manifest = Manifest::default();

    // Parse breeds
    if let Some(breeds) = section(table, "breed")? {
        for (name, value) in breeds {
            let breed = parse_breed(name, value)?;
            manifest.breeds.insert(name.clone(), breed);
        }
    }

    // Parse scales
    if let Some(scales) = section(table, "scale")? {
        for (name, value) in scales {
            let scale = parse_scale(name, value)?;
            manifest.scales.insert(name.clone(), scale);
        }
    }

    // Parse workflows
    if let Some(workflows) = section(table, "workflow")? {
        for (name, value) in workflows {
            let workflow = parse_workflow(name, value)?;
            manifest.workflows.insert(name.clone(), workflow);
        }
    }

    Ok(manifest)
}

/// Parse and validate every `*.toml` file in `dir`, in name order.
///
/// A missing directory is an empty manifest.
pub fn load_dir(dir: &Path) -> Result<Manifest, ParseError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Manifest::default()),
        Err(source) => {
            return Err(ParseError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut manifest = Manifest::default();
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| ParseError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed = parse_manifest(&content).map_err(|e| ParseError::File {
            path: path.clone(),
            source: Box::new(e),
        })?;
        manifest.merge(parsed).map_err(|e| ParseError::File {
            path,
            source: Box::new(e),
        })?;
    }

    crate::validate(&manifest)?;
    Ok(manifest)
}

fn section<'a>(
    table: &'a toml::map::Map<String, toml::Value>,
    key: &str,
) -> Result<Option<&'a toml::map::Map<String, toml::Value>>, ParseError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_table()
            .map(Some)
            .ok_or_else(|| ParseError::InvalidFormat(format!("{} must be a table", key))),
    }
}

fn parse_breed(name: &str, value: &toml::Value) -> Result<Breed, ParseError> {
    let table = value
        .as_table()
        .ok_or_else(|| ParseError::InvalidFormat(format!("breed.{} must be a table", name)))?;

    let kind = required_str(table, "breed", name, "kind")?;
    let definition = required_str(table, "breed", name, "definition")?;

    Ok(Breed {
        name: name.to_string(),
        deployable: Deployable::new(kind, definition),
    })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ScaleDef {
    cpu: f64,
    memory: String,
    #[serde(default = "default_instances")]
    instances: u32,
}

fn default_instances() -> u32 {
    1
}

fn parse_scale(name: &str, value: &toml::Value) -> Result<Scale, ParseError> {
    let def: ScaleDef = value
        .clone()
        .try_into()
        .map_err(|e| ParseError::InvalidFormat(format!("scale.{}: {}", name, e)))?;

    Ok(Scale {
        name: name.to_string(),
        cpu: def.cpu,
        memory: def.memory,
        instances: def.instances,
    })
}

fn parse_workflow(name: &str, value: &toml::Value) -> Result<Workflow, ParseError> {
    let table = value
        .as_table()
        .ok_or_else(|| ParseError::InvalidFormat(format!("workflow.{} must be a table", name)))?;

    let breed = required_str(table, "workflow", name, "breed")?;
    let schedule = table
        .get("schedule")
        .ok_or_else(|| ParseError::MissingField(format!("workflow.{}.schedule", name)))
        .and_then(|v| parse_schedule(name, v))?;

    let status = match table.get("status") {
        None => WorkflowStatus::Starting,
        Some(value) => value
            .as_str()
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!("workflow.{}.status must be a string", name))
            })?
            .parse::<WorkflowStatus>()
            .map_err(|e| ParseError::InvalidFormat(format!("workflow.{}.status: {}", name, e)))?,
    };

    let mut workflow = Workflow::new(name, breed, schedule).with_status(status);
    if let Some(scale) = table.get("scale") {
        let scale = scale.as_str().ok_or_else(|| {
            ParseError::InvalidFormat(format!("workflow.{}.scale must be a string", name))
        })?;
        workflow = workflow.with_scale(scale);
    }
    Ok(workflow)
}

fn required_str<'a>(
    table: &'a toml::map::Map<String, toml::Value>,
    section: &str,
    name: &str,
    key: &str,
) -> Result<&'a str, ParseError> {
    table
        .get(key)
        .ok_or_else(|| ParseError::MissingField(format!("{}.{}.{}", section, name, key)))?
        .as_str()
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!("{}.{}.{} must be a string", section, name, key))
        })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
