// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tollgate integration tests.
//!
//! Provides deterministic resolvers and a loopback listener so egress tests
//! run without real DNS or outside network access.
//!
//! # Components
//!
//! - [`StaticResolver`] - answers every lookup with a fixed address list
//! - [`FailingResolver`] - fails every lookup
//! - [`CountingResolver`] - wraps a resolver and counts lookups
//! - [`StallingResolver`] - never answers, for timeout paths
//! - [`LoopbackServer`] - minimal HTTP responder on 127.0.0.1 that records
//!   every accepted peer connection

pub mod harness;
pub mod resolvers;

pub use harness::LoopbackServer;
pub use resolvers::{CountingResolver, FailingResolver, StallingResolver, StaticResolver};
