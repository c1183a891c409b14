// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Declarative manifests of breeds, scales, and workflows

mod parser;
mod schedule;
mod validate;

pub use parser::{load_dir, parse_manifest, Manifest, ParseError};
pub use schedule::parse_schedule;
pub use validate::{is_valid_name, validate};
