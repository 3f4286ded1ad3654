// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Egress-safe HTTP transport for the Tollgate workspace.
//!
//! Three layers, leaf to root:
//!
//! - [`classify`]: decides whether an IP literal is non-public.
//! - [`dial`]: resolves a host, picks the first public candidate and connects
//!   to that literal, never re-resolving the name.
//! - [`client`]: builds HTTP clients, installing the safe dialer as the
//!   transport's resolver hook when private networks are to be blocked.
//!
//! The crate never reads global configuration; the blocking decision is an
//! explicit [`ClientConfig`] field.

pub mod classify;
pub mod client;
pub mod dial;

pub use classify::{
    AddressPolicy, NonPublicReason, classify, classify_str, is_non_public, parse_literal,
};
pub use client::{Client, ClientConfig, Request, build_client, build_client_with_resolver};
pub use dial::{DialAttempt, HostResolver, SafeDialer, SystemResolver, split_host_port};
pub use tollgate_core::EgressError;
