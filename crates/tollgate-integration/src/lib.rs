// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration consumers built on the egress-safe client.
//!
//! Each integration obtains a client from [`tollgate_egress::build_client`]
//! and maps its outcomes onto [`TollgateError`]: transport failures,
//! including policy blocks, arrive as `TollgateError::Egress` unchanged, and
//! remote rejections become `TollgateError::Integration`.

pub mod archiveorg;
pub mod pushover;
pub mod rssbridge;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tollgate_core::TollgateError;

pub use archiveorg::ArchiveOrgClient;
pub use pushover::PushoverClient;
pub use rssbridge::{Bridge, BridgeMeta, detect_bridges};

/// `User-Agent` sent by every integration.
pub const USER_AGENT: &str = concat!("Tollgate/", env!("CARGO_PKG_VERSION"));

/// The feed an entry belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
}

/// One feed entry handed to an integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub url: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// "404 Not Found" style status line.
pub(crate) fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

/// Wrap a body read or decode failure.
pub(crate) fn body_error(
    integration: &'static str,
    what: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> TollgateError {
    TollgateError::Integration {
        integration,
        message: format!("unable to {what}: {source}"),
        source: Some(Box::new(source)),
    }
}
