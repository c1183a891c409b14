// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for daemon tests

use std::time::Duration;

use tempfile::TempDir;

use crate::lifecycle::{Config, MANIFEST_DIR};
use crate::settings::SETTINGS_FILE;

pub(crate) const MANIFEST: &str = r#"
[breed.hello]
kind = "container/docker"
definition = "hello:1.0"

[workflow.w1]
breed = "hello"
status = "running"
schedule = { event = ["deploy-now"] }

[workflow.w2]
breed = "hello"
status = "running"
schedule = "daemon"

[workflow.idle]
breed = "hello"
schedule = "none"
"#;

pub(crate) struct Project {
    _root: TempDir,
    _state: TempDir,
    pub config: Config,
}

pub(crate) fn project(manifest: &str) -> Project {
    let root = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    let manifest_dir = root.path().join(MANIFEST_DIR);
    std::fs::create_dir_all(&manifest_dir).unwrap();
    std::fs::write(manifest_dir.join("main.toml"), manifest).unwrap();
    std::fs::write(
        root.path().join(SETTINGS_FILE),
        "call_timeout = \"2s\"\nworkers = 2\n",
    )
    .unwrap();

    let config = Config::with_dirs(root.path(), state.path(), state.path()).unwrap();
    Project {
        _root: root,
        _state: state,
        config,
    }
}

/// Poll `check` until it holds or two seconds pass
pub(crate) async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
