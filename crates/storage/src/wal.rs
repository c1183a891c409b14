// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;
use wf_core::Operation;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Append-only log of operations, one JSON entry per line
pub struct Wal {
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path, creating parent directories
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        // Continue numbering after the last entry on disk, and cut anything
        // after it so new entries start on a fresh line
        let content = std::fs::read(path)?;
        let mut sequence = 0;
        let mut valid_end = 0;
        let mut terminated = true;
        let mut offset = 0;
        for line in content.split_inclusive(|b| *b == b'\n') {
            offset += line.len();
            if let Ok(entry) = serde_json::from_slice::<WalEntry>(line) {
                sequence = entry.seq;
                valid_end = offset;
                terminated = line.ends_with(b"\n");
            }
        }
        if valid_end < content.len() {
            tracing::warn!(
                bytes = content.len() - valid_end,
                "truncating torn WAL tail"
            );
            file.set_len(valid_end as u64)?;
        }
        if !terminated {
            file.write_all(b"\n")?;
        }
        file.sync_all()?;

        Ok(Self { file, sequence })
    }

    /// Append an operation and fsync before returning its sequence number
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        let entry = WalEntry {
            seq: self.sequence + 1,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        self.sequence = entry.seq;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all operations from the log.
    ///
    /// A missing file is an empty log. An unreadable final line is a write
    /// torn by a crash and is dropped; anywhere else it is an error.
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
        let last = lines.iter().rposition(|l| !l.trim().is_empty());

        let mut ops = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry>(line) {
                Ok(entry) => ops.push(entry.op),
                Err(e) if Some(index) == last => {
                    tracing::warn!(line = index + 1, error = %e, "dropping torn WAL tail");
                }
                Err(source) => {
                    return Err(WalError::Corrupt {
                        line: index + 1,
                        source,
                    })
                }
            }
        }

        Ok(ops)
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
