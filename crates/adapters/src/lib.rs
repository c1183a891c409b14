// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collaborator seams for the workflow reconciler
//!
//! Each trait is one external system the reconciler talks to. The
//! in-process implementations here back the daemon; the fakes back tests.

pub mod bus;
pub mod driver;
pub mod kv;
pub mod notify;
pub mod persistence;
pub mod traced;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use bus::{BusError, EventBusAdapter, LocalEventBus};
pub use driver::{DriverAdapter, DriverError};
pub use kv::{KeyValueAdapter, KeyValueError, MemoryKeyValueStore};
pub use notify::{Collaborator, LogNotifyAdapter, NotifyAdapter, Report, ReportKind};
pub use persistence::{PersistenceAdapter, PersistenceError};
pub use traced::{TracedDriverAdapter, TracedEventBusAdapter, TracedKeyValueAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{
    AdapterCall, FakeAdapters, FakeDriverAdapter, FakeEventBusAdapter, FakeKeyValueAdapter,
    FakeNotifyAdapter, FakeOp, FakePersistenceAdapter,
};
