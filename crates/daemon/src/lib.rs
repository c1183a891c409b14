// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wf-daemon: the `wfd` process that hosts the workflow reconciler
//!
//! The library half exposes the pieces the binary wires together, plus the
//! socket protocol so clients can talk to a running daemon.

pub mod driver;
pub mod lifecycle;
pub mod protocol;
pub mod server;
pub mod settings;
pub mod store;
pub mod timers;

#[cfg(test)]
mod test_support;

pub use driver::LocalDriver;
pub use lifecycle::{startup, Config, DaemonState, LifecycleError};
pub use settings::{Settings, SettingsError};
pub use store::StorePersistence;
pub use timers::Timers;
