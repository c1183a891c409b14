// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use wf_adapters::{
    LocalEventBus, LogNotifyAdapter, MemoryKeyValueStore, TracedDriverAdapter,
    TracedEventBusAdapter, TracedKeyValueAdapter,
};
use wf_core::{MatchedTrigger, Operation, SystemClock, Workflow};
use wf_engine::{Dispatcher, Message, Reconciler, ReconcilerDeps, StepError, Synchronizer};
use wf_manifest::Manifest;
use wf_storage::{MaterializedState, Wal, WalError};

use crate::driver::LocalDriver;
use crate::settings::{Settings, SettingsError};
use crate::store::StorePersistence;

/// Manifest directory, relative to the project root
pub const MANIFEST_DIR: &str = ".wf/workflows";

pub type DaemonBus = TracedEventBusAdapter<LocalEventBus>;
pub type DaemonKv = TracedKeyValueAdapter<MemoryKeyValueStore>;
pub type DaemonDriver = TracedDriverAdapter<LocalDriver<DaemonKv, SystemClock>>;

/// Reconciler with concrete adapter types (wrapped with tracing)
pub type DaemonReconciler =
    Reconciler<StorePersistence, DaemonBus, DaemonKv, DaemonDriver, LogNotifyAdapter>;

pub type DaemonSynchronizer = Synchronizer<StorePersistence, DaemonBus, DaemonDriver>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root directory
    pub project_root: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the workflow WAL
    pub wal_path: PathBuf,
}

impl Config {
    /// Create config for a project
    pub fn for_project(project_root: &Path) -> Result<Self, LifecycleError> {
        Self::with_dirs(project_root, &state_dir()?, &socket_dir())
    }

    /// Create config rooted at explicit state and socket directories
    pub fn with_dirs(
        project_root: &Path,
        state_root: &Path,
        socket_dir: &Path,
    ) -> Result<Self, LifecycleError> {
        let canonical = project_root
            .canonicalize()
            .map_err(|e| LifecycleError::ProjectNotFound(project_root.to_path_buf(), e))?;

        let hash = project_hash(&canonical);
        let state_dir = state_root.join("projects").join(&hash);

        Ok(Self {
            project_root: canonical,
            socket_path: socket_dir.join(format!("{}.sock", hash)),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("workflows.wal"),
        })
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.project_root.join(MANIFEST_DIR)
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    pub settings: Settings,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// WAL-backed workflow and artifact store
    pub store: StorePersistence,
    pub bus: DaemonBus,
    pub driver: DaemonDriver,
    pub synchronizer: DaemonSynchronizer,
    /// Triggers matched by the bus, waiting to be dispatched
    pub triggers: mpsc::UnboundedReceiver<MatchedTrigger>,
    dispatcher: Option<Dispatcher>,
    /// When daemon started
    pub start_time: Instant,
    /// Shutdown requested flag
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// Hand a message to the reconciler workers
    pub fn dispatch(&self, message: Message) -> bool {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch(message),
            None => {
                warn!("dispatcher stopped, message dropped");
                false
            }
        }
    }

    /// Queue a desired-state update for every persisted workflow.
    /// Returns how many were queued.
    pub async fn sync(&self) -> Result<usize, LifecycleError> {
        let mut queued = 0;
        for message in self.synchronizer.tick().await? {
            if self.dispatch(message) {
                queued += 1;
            }
        }
        Ok(queued)
    }

    /// Queue an execution pass for a matched subscription
    pub fn handle_trigger(&self, matched: MatchedTrigger) -> bool {
        self.dispatch(Message::from(matched))
    }

    /// Fire due driver timers. Returns the names that ran.
    pub async fn poll_driver(&self) -> Vec<String> {
        self.driver.inner().poll().await
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Let in-flight passes finish
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.shutdown().await;
        }

        // 2. Remove socket file
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 3. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Remove version file
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("Failed to remove version file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Project not found at {0}: {1}")]
    ProjectNotFound(PathBuf, std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] wf_manifest::ParseError),

    #[error("Synchronization failed: {0}")]
    Sync(#[from] StepError),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Another daemon owns these files
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create directories
    for path in [&config.lock_path, &config.socket_path, &config.wal_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Settings and manifests BEFORE binding socket (fail fast)
    let settings = Settings::load(&config.project_root)?;
    let manifest = wf_manifest::load_dir(&config.manifest_dir())?;

    // 4. Load state from WAL
    let ops = Wal::replay(&config.wal_path)?;
    let wal = Wal::open(&config.wal_path)?;
    let state = MaterializedState::replay(&ops);

    info!(
        "Loaded state: {} workflows, {} breeds, {} scales",
        state.workflows.len(),
        state.breeds.len(),
        state.scales.len()
    );

    let store = StorePersistence::new(wal, state);

    // 5. Fold the declarations into the store
    let written = apply_manifest(&store, &manifest)?;
    info!(
        "Applied manifest: {} declarations, {} written",
        manifest.breeds.len() + manifest.scales.len() + manifest.workflows.len(),
        written
    );

    // 6. Set up adapters (wrapped with tracing for observability)
    let engine_config = settings.engine_config();
    let (bus, triggers) = LocalEventBus::new(settings.event_history);
    let bus = TracedEventBusAdapter::new(bus);
    let kv = TracedKeyValueAdapter::new(MemoryKeyValueStore::new());
    let driver = TracedDriverAdapter::new(LocalDriver::new(
        kv.clone(),
        store.clone(),
        SystemClock,
    ));

    // 7. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // 8. Reconciler workers
    let reconciler: DaemonReconciler = Reconciler::new(
        ReconcilerDeps {
            persistence: store.clone(),
            bus: bus.clone(),
            kv,
            driver: driver.clone(),
            notify: LogNotifyAdapter::new(),
        },
        engine_config,
    );
    let dispatcher = Dispatcher::spawn(Arc::new(reconciler), settings.workers);
    let synchronizer = Synchronizer::new(store.clone(), bus.clone(), driver.clone(), engine_config);

    info!(
        "Daemon started for project: {}",
        config.project_root.display()
    );

    Ok(DaemonState {
        config: config.clone(),
        settings,
        lock_file,
        listener,
        store,
        bus,
        driver,
        synchronizer,
        triggers,
        dispatcher: Some(dispatcher),
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove version file
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Write manifest declarations into the store.
///
/// New workflows take their declared status. Workflows already in the store
/// keep the status they have; only their declaration is updated. Returns the
/// number of operations written.
pub fn apply_manifest(store: &StorePersistence, manifest: &Manifest) -> Result<usize, WalError> {
    let mut written = 0;

    for breed in manifest.breeds.values() {
        if store.read(|s| s.breeds.get(&breed.name) != Some(breed)) {
            store.persist(Operation::BreedPut {
                breed: breed.clone(),
            })?;
            written += 1;
        }
    }

    for scale in manifest.scales.values() {
        if store.read(|s| s.scales.get(&scale.name) != Some(scale)) {
            store.persist(Operation::ScalePut {
                scale: scale.clone(),
            })?;
            written += 1;
        }
    }

    for declared in manifest.workflows.values() {
        let workflow = match store.workflow(&declared.name) {
            None => declared.clone(),
            Some(existing) => {
                let merged = Workflow {
                    status: existing.status,
                    ..declared.clone()
                };
                if merged == existing {
                    continue;
                }
                merged
            }
        };
        store.persist(Operation::WorkflowPut { workflow })?;
        written += 1;
    }

    Ok(written)
}

/// Get the state directory for wf
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // Use XDG_STATE_HOME or default to ~/.local/state
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("wf"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/wf"))
}

/// Get the socket directory for wf
///
/// Uses /tmp/wf by default to keep paths short (macOS SUN_LEN = 104).
/// Can be overridden with WF_SOCKET_DIR for testing.
fn socket_dir() -> PathBuf {
    match std::env::var("WF_SOCKET_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => PathBuf::from("/tmp/wf"),
    }
}

/// Compute project hash for unique daemon directory
fn project_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let result = hasher.finalize();
    hex_encode(&result[..8])
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
