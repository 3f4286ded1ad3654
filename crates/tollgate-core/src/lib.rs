// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tollgate workspace.
//!
//! Provides the error taxonomy shared by the egress transport, the
//! integrations and the CLI, plus redaction of IP literals from error text.

pub mod error;
pub mod redact;

// Re-export key items at crate root for ergonomic imports.
pub use error::{EgressError, TollgateError};
pub use redact::redact_addresses;
