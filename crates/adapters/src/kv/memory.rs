// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory key-value store

use super::{KeyValueAdapter, KeyValueError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wf_core::KeyPath;

/// Key-value store held in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<KeyPath, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueAdapter for MemoryKeyValueStore {
    async fn set(&self, path: &KeyPath, value: Option<String>) -> Result<(), KeyValueError> {
        if path.segments().is_empty() || path.segments().iter().any(|s| s.is_empty()) {
            return Err(KeyValueError::InvalidPath(path.to_string()));
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match value {
            Some(value) => {
                entries.insert(path.clone(), value);
            }
            None => {
                entries.remove(path);
            }
        }
        Ok(())
    }

    async fn get(&self, path: &KeyPath) -> Result<Option<String>, KeyValueError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(path).cloned())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
