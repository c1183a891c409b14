// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project daemon settings read from `.wf/config.toml`

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wf_engine::EngineConfig;

/// Location of the settings file, relative to the project root
pub const SETTINGS_FILE: &str = ".wf/config.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// How often every workflow gets a desired-state update
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Size of the dispatcher worker pool
    pub workers: usize,
    /// Deadline for a single collaborator call
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Number of recent events the bus keeps
    pub event_history: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            workers: 4,
            call_timeout: Duration::from_secs(10),
            event_history: 256,
        }
    }
}

impl Settings {
    /// Load settings for a project; a missing file yields the defaults
    pub fn load(project_root: &Path) -> Result<Self, SettingsError> {
        let path = project_root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        let settings = Self::parse(&content).map_err(|e| match e {
            SettingsError::Toml { source, .. } => SettingsError::Toml { path, source },
            other => other,
        })?;
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content).map_err(|source| SettingsError::Toml {
            path: PathBuf::from(SETTINGS_FILE),
            source,
        })?;
        settings.check()?;
        Ok(settings)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::with_call_timeout(self.call_timeout)
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.tick_interval.is_zero() {
            return Err(SettingsError::Invalid("tick_interval must be > 0".into()));
        }
        if self.workers == 0 {
            return Err(SettingsError::Invalid("workers must be >= 1".into()));
        }
        if self.call_timeout.is_zero() {
            return Err(SettingsError::Invalid("call_timeout must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
