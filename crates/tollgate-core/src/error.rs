// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tollgate workspace.
//!
//! [`EgressError`] is the transport-level taxonomy surfaced by every outbound
//! call. [`TollgateError`] is the service-level error that integrations return;
//! it wraps egress failures unchanged so callers can still tell a policy block
//! apart from a remote service rejecting the request.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::redact::redact_addresses;

/// Errors raised while establishing or using an outbound connection.
#[derive(Debug, Error)]
pub enum EgressError {
    /// The destination is non-public: every resolved candidate, or the IP
    /// literal itself. Carries the host the caller asked for, never the
    /// resolved addresses.
    #[error("connection to host {host:?} is blocked: destination is a non-public address")]
    Blocked { host: String },

    /// Name resolution failed outright or returned no addresses.
    #[error("unable to resolve host {host:?}: {reason}")]
    ResolutionFailed { host: String, reason: String },

    /// The `host:port` dial target could not be parsed.
    #[error("unable to parse address {addr:?}: {reason}")]
    MalformedAddress { addr: String, reason: String },

    /// Resolution or connect exceeded the configured timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Connecting to an already-validated address failed.
    #[error("unable to connect to host {host:?}: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Input handed to the address classifier was not an IP literal.
    #[error("invalid IP address literal {input:?}")]
    InvalidAddress { input: String },

    /// The outbound request could not be assembled.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport failure, passed through untouched.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl EgressError {
    /// True when the error is the security policy refusing a destination.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Convert a transport error, recovering any dial-level error raised inside
    /// the resolver hook or redirect policy.
    ///
    /// reqwest boxes errors coming out of its DNS resolver and redirect policy,
    /// so the original variant is only reachable through the source chain.
    pub fn from_transport(err: reqwest::Error) -> Self {
        match find_dial_error(&err) {
            Some(found) => found,
            None => Self::Transport(err),
        }
    }

    /// Rebuild the variants that can cross the reqwest boundary by reference.
    fn detach(&self) -> Option<Self> {
        match self {
            Self::Blocked { host } => Some(Self::Blocked { host: host.clone() }),
            Self::ResolutionFailed { host, reason } => Some(Self::ResolutionFailed {
                host: host.clone(),
                reason: reason.clone(),
            }),
            Self::MalformedAddress { addr, reason } => Some(Self::MalformedAddress {
                addr: addr.clone(),
                reason: reason.clone(),
            }),
            Self::Timeout { duration } => Some(Self::Timeout {
                duration: *duration,
            }),
            Self::Connect { host, source } => Some(Self::Connect {
                host: host.clone(),
                source: std::io::Error::new(source.kind(), source.to_string()),
            }),
            _ => None,
        }
    }
}

fn find_dial_error(err: &(dyn StdError + 'static)) -> Option<EgressError> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(egress) = cause.downcast_ref::<EgressError>() {
            return egress.detach();
        }
        source = cause.source();
    }
    None
}

/// The primary service-level error returned by integrations and the CLI.
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Configuration errors (invalid TOML, bad ranges, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure, propagated unchanged.
    #[error(transparent)]
    Egress(#[from] EgressError),

    /// The remote integration rejected the call or answered with garbage.
    #[error("{integration}: {message}")]
    Integration {
        integration: &'static str,
        message: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    /// Shorthand for an integration error without an underlying cause.
    pub fn integration(integration: &'static str, message: impl Into<String>) -> Self {
        Self::Integration {
            integration,
            message: message.into(),
            source: None,
        }
    }

    /// True when the egress policy refused the destination.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Egress(e) if e.is_blocked())
    }

    /// Render the error for an untrusted audience, with IP literals removed.
    pub fn public_message(&self) -> String {
        redact_addresses(&self.to_string())
    }
}
