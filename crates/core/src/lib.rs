// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wf-core: data model for the workflow reconciler
//!
//! This crate provides:
//! - Workflows, their schedules, and lifecycle status
//! - Artifacts (breeds and scales) that workflows reference
//! - Bus events and percolator subscriptions
//! - WAL operations and a testable clock

pub mod artifact;
pub mod clock;
pub mod event;
pub mod operation;
pub mod schedule;
pub mod status;
pub mod workflow;

pub use artifact::{ArtifactKind, Breed, Deployable, Scale, WORKFLOW_DEPLOYABLE_KINDS};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{Event, MatchedTrigger, Subscription, SCHEDULED_TAG, UNSCHEDULED_TAG};
pub use operation::Operation;
pub use schedule::{Schedule, TimeSchedule};
pub use status::{RestartPhase, UnknownStatus, WorkflowStatus};
pub use workflow::{DeployableWorkflow, KeyPath, Workflow};
