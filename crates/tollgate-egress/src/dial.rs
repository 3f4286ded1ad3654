// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Safe dial strategy: resolve, pick the first public address, connect to it.
//!
//! [`SafeDialer`] is also the DNS hook installed into guarded HTTP clients.
//! Whatever it hands back is the exact address the connector dials, so the
//! address that was classified and the address that is connected to are the
//! same literal. Every call resolves afresh; there is no address cache.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tokio::net::TcpStream;
use tollgate_core::EgressError;
use tracing::{debug, warn};

use crate::classify::AddressPolicy;

/// Name resolution used by the dialer.
///
/// Implementations return every candidate address in the order the
/// underlying resolver produced them.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` to candidate addresses.
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// The operating system resolver (`getaddrinfo` via tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// State of one connection establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialAttempt {
    /// The `host:port` the caller asked for.
    pub target: String,
    pub host: String,
    pub port: u16,
    /// Every address the resolver returned, in resolver order.
    pub candidates: Vec<IpAddr>,
    /// The first candidate the policy accepted.
    pub chosen: IpAddr,
}

impl DialAttempt {
    /// The literal socket address that will be connected to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.chosen, self.port)
    }
}

/// Split `host:port` or `[v6]:port`.
pub fn split_host_port(addr: &str) -> Result<(String, u16), EgressError> {
    let malformed = |reason: &str| EgressError::MalformedAddress {
        addr: addr.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| malformed("missing ']' in address"))?;
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| malformed("missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| malformed("missing port in address"))?;
        if host.contains(':') {
            return Err(malformed("too many colons in address"));
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(malformed("missing host"));
    }
    if host.contains(['[', ']']) {
        return Err(malformed("unexpected bracket in host"));
    }
    let port = port.parse::<u16>().map_err(|_| malformed("invalid port"))?;

    Ok((host.to_string(), port))
}

/// Resolves a host and connects only to an address the policy accepts.
#[derive(Clone)]
pub struct SafeDialer {
    resolver: Arc<dyn HostResolver>,
    policy: Arc<AddressPolicy>,
    timeout: Duration,
}

impl fmt::Debug for SafeDialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeDialer")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SafeDialer {
    /// A dialer using the system resolver and the bare classifier.
    pub fn new(timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(SystemResolver),
            policy: Arc::new(AddressPolicy::default()),
            timeout,
        }
    }

    /// Replace the resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the address policy.
    pub fn with_policy(mut self, policy: AddressPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn policy(&self) -> &AddressPolicy {
        &self.policy
    }

    /// Resolve `host` and return all candidates plus the first public one.
    pub async fn select(&self, host: &str) -> Result<(Vec<IpAddr>, IpAddr), EgressError> {
        let candidates = match tokio::time::timeout(self.timeout, self.resolver.lookup(host)).await
        {
            Err(_) => {
                return Err(EgressError::Timeout {
                    duration: self.timeout,
                });
            }
            Ok(Err(e)) => {
                return Err(EgressError::ResolutionFailed {
                    host: host.to_string(),
                    reason: e.to_string(),
                });
            }
            Ok(Ok(candidates)) => candidates,
        };

        if candidates.is_empty() {
            return Err(EgressError::ResolutionFailed {
                host: host.to_string(),
                reason: "no addresses returned".to_string(),
            });
        }

        let chosen = candidates.iter().copied().find(|ip| match self.policy.check(*ip) {
            Some(reason) => {
                debug!(host = %host, %reason, "skipping non-public candidate");
                false
            }
            None => true,
        });

        match chosen {
            Some(ip) => {
                debug!(host = %host, candidates = candidates.len(), "selected public address");
                Ok((candidates, ip))
            }
            None => {
                warn!(
                    host = %host,
                    candidates = candidates.len(),
                    "egress blocked: host resolves only to non-public addresses"
                );
                Err(EgressError::Blocked {
                    host: host.to_string(),
                })
            }
        }
    }

    /// Parse, resolve and select without connecting.
    pub async fn plan(&self, addr: &str) -> Result<DialAttempt, EgressError> {
        let (host, port) = split_host_port(addr)?;
        let (candidates, chosen) = self.select(&host).await?;
        Ok(DialAttempt {
            target: addr.to_string(),
            host,
            port,
            candidates,
            chosen,
        })
    }

    /// Open a TCP connection to the chosen literal address.
    ///
    /// Dropping the returned future aborts the lookup wait or the connect in
    /// flight; a half-open socket is closed on drop.
    pub async fn dial(&self, addr: &str) -> Result<TcpStream, EgressError> {
        let attempt = self.plan(addr).await?;
        self.connect(&attempt).await
    }

    /// Connect to the literal an earlier [`SafeDialer::plan`] chose.
    pub async fn connect(&self, attempt: &DialAttempt) -> Result<TcpStream, EgressError> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(attempt.socket_addr())).await {
            Err(_) => Err(EgressError::Timeout {
                duration: self.timeout,
            }),
            Ok(Err(source)) => Err(EgressError::Connect {
                host: attempt.host.clone(),
                source,
            }),
            Ok(Ok(stream)) => Ok(stream),
        }
    }
}

impl Resolve for SafeDialer {
    fn resolve(&self, name: Name) -> Resolving {
        let dialer = self.clone();
        Box::pin(async move {
            let (_, ip) = dialer
                .select(name.as_str())
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
            // A single address, so the connector cannot fall through to an
            // unvalidated candidate. The connector fills in the request port.
            let addrs: Addrs = Box::new(std::iter::once(SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}
