// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic [`HostResolver`] implementations.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tollgate_egress::HostResolver;

/// Answers lookups from a fixed table, preserving the configured order.
///
/// Hosts without an entry fall back to the default answer, or fail with
/// `NotFound` when there is none.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    default: Option<Vec<IpAddr>>,
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Every host resolves to `addrs`.
    pub fn new(addrs: &[&str]) -> Self {
        Self {
            default: Some(parse_all(addrs)),
            hosts: HashMap::new(),
        }
    }

    /// An empty table: every host is NXDOMAIN until added.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Answer `host` with `addrs`.
    pub fn with_host(mut self, host: &str, addrs: &[&str]) -> Self {
        self.hosts.insert(host.to_string(), parse_all(addrs));
        self
    }
}

fn parse_all(addrs: &[&str]) -> Vec<IpAddr> {
    addrs
        .iter()
        .map(|a| a.parse().expect("test resolver addresses must be IP literals"))
        .collect()
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(host)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no such host: {host}"))
            })
    }
}

/// Fails every lookup with the given message.
#[derive(Debug, Clone)]
pub struct FailingResolver {
    message: String,
}

impl FailingResolver {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl HostResolver for FailingResolver {
    async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        Err(io::Error::other(self.message.clone()))
    }
}

/// Wraps another resolver and counts lookups.
pub struct CountingResolver {
    inner: Arc<dyn HostResolver>,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(inner: Arc<dyn HostResolver>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for CountingResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(host).await
    }
}

/// Never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StallingResolver;

#[async_trait]
impl HostResolver for StallingResolver {
    async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        std::future::pending().await
    }
}
