// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value staging store

mod memory;

pub use memory::MemoryKeyValueStore;

use async_trait::async_trait;
use thiserror::Error;
use wf_core::KeyPath;

/// Errors from key-value operations
#[derive(Debug, Error)]
pub enum KeyValueError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for the key-value store used to stage deployable definitions
#[async_trait]
pub trait KeyValueAdapter: Clone + Send + Sync + 'static {
    /// Write a value; `None` removes the key
    async fn set(&self, path: &KeyPath, value: Option<String>) -> Result<(), KeyValueError>;

    /// Read a value
    async fn get(&self, path: &KeyPath) -> Result<Option<String>, KeyValueError>;
}
