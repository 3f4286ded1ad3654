// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Address classifier deciding whether an IP literal is non-public.
//!
//! The classifier is pure and total over [`IpAddr`]: it never touches the
//! network. Anything that is not plainly globally routable unicast is treated
//! as non-public, so newly reserved or ambiguous blocks fail closed.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;
use tollgate_core::EgressError;
use tracing::info;

/// Why an address was classified as non-public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum NonPublicReason {
    /// `0.0.0.0`, `::`.
    Unspecified,
    /// `127.0.0.0/8`, `::1`.
    Loopback,
    /// RFC 1918: `10.0.0.0/8`, `172.16.0.0/12`, `192.168.0.0/16`.
    Private,
    /// `169.254.0.0/16`, `fe80::/10`.
    LinkLocal,
    /// `224.0.0.0/4`, `ff00::/8`.
    Multicast,
    /// `255.255.255.255`.
    Broadcast,
    /// `0.0.0.0/8`.
    ThisNetwork,
    /// Carrier-grade NAT, `100.64.0.0/10`.
    SharedAddressSpace,
    /// `192.0.0.0/24`, `2001::/23`.
    ProtocolAssignment,
    /// TEST-NET ranges, `2001:db8::/32`, `3fff::/20`.
    Documentation,
    /// `198.18.0.0/15`.
    Benchmarking,
    /// `240.0.0.0/4` and IPv6 space outside `2000::/3`.
    Reserved,
    /// `fc00::/7`.
    UniqueLocal,
    /// Deprecated `fec0::/10`.
    SiteLocal,
    /// IPv4-compatible, NAT64 and 6to4 prefixes.
    Translated,
    /// `100::/64`.
    Discard,
    /// A range the deployment added to the policy.
    Deployment,
}

/// Classify an address. `None` means public.
pub fn classify(ip: IpAddr) -> Option<NonPublicReason> {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

/// Boolean projection of [`classify`].
pub fn is_non_public(ip: IpAddr) -> bool {
    classify(ip).is_some()
}

/// Parse and classify an IP literal. Brackets around IPv6 are tolerated.
///
/// Unparsable input is an error, never "public".
pub fn classify_str(input: &str) -> Result<Option<NonPublicReason>, EgressError> {
    parse_literal(input).map(classify)
}

/// Parse an IP literal, tolerating surrounding whitespace and IPv6 brackets.
pub fn parse_literal(input: &str) -> Result<IpAddr, EgressError> {
    let trimmed = input.trim();
    let literal = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    literal
        .parse::<IpAddr>()
        .map_err(|_| EgressError::InvalidAddress {
            input: input.to_string(),
        })
}

fn classify_v4(ip: Ipv4Addr) -> Option<NonPublicReason> {
    use NonPublicReason::*;

    let [a, b, c, _] = ip.octets();
    let reason = if ip.is_unspecified() {
        Unspecified
    } else if ip.is_loopback() {
        Loopback
    } else if ip.is_private() {
        Private
    } else if ip.is_link_local() {
        LinkLocal
    } else if ip.is_multicast() {
        Multicast
    } else if ip.is_broadcast() {
        Broadcast
    } else if a == 0 {
        ThisNetwork
    } else if a == 100 && (b & 0xc0) == 64 {
        SharedAddressSpace
    } else if a == 192 && b == 0 && c == 0 {
        ProtocolAssignment
    } else if ip.is_documentation() {
        Documentation
    } else if a == 198 && (b & 0xfe) == 18 {
        Benchmarking
    } else if a >= 240 {
        Reserved
    } else {
        return None;
    };
    Some(reason)
}

fn classify_v6(ip: Ipv6Addr) -> Option<NonPublicReason> {
    use NonPublicReason::*;

    if ip.is_unspecified() {
        return Some(Unspecified);
    }
    if ip.is_loopback() {
        return Some(Loopback);
    }
    // ::ffff:a.b.c.d reaches the embedded IPv4 host.
    if let Some(v4) = ip.to_ipv4_mapped() {
        return classify_v4(v4);
    }

    let seg = ip.segments();
    let reason = if seg[0] & 0xff00 == 0xff00 {
        Multicast
    } else if seg[0] & 0xffc0 == 0xfe80 {
        LinkLocal
    } else if seg[0] & 0xffc0 == 0xfec0 {
        SiteLocal
    } else if seg[0] & 0xfe00 == 0xfc00 {
        UniqueLocal
    } else if seg[..6] == [0; 6] {
        // IPv4-compatible ::a.b.c.d
        Translated
    } else if seg[0] == 0x64 && seg[1] == 0xff9b && (seg[2..6] == [0; 4] || seg[2] == 1) {
        // NAT64 64:ff9b::/96 and 64:ff9b:1::/48
        Translated
    } else if seg[0] == 0x100 && seg[1..4] == [0; 3] {
        Discard
    } else if (seg[0] == 0x2001 && seg[1] == 0x0db8) || (seg[0] == 0x3fff && seg[1] < 0x1000) {
        // 2001:db8::/32 and 3fff::/20
        Documentation
    } else if seg[0] == 0x2001 && seg[1] < 0x0200 {
        ProtocolAssignment
    } else if seg[0] == 0x2002 {
        // 6to4
        Translated
    } else if seg[0] & 0xe000 != 0x2000 {
        // Only 2000::/3 is allocated as global unicast.
        Reserved
    } else {
        return None;
    };
    Some(reason)
}

/// Deployment policy layered over [`classify`].
///
/// `extra_blocked` adds ranges the deployment treats as internal;
/// `allowed_private_ips` exempts exact addresses an operator has vetted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPolicy {
    extra_blocked: Vec<IpNet>,
    allowed_private_ips: Vec<IpAddr>,
}

impl AddressPolicy {
    /// The bare classifier with no deployment additions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat an additional range as non-public.
    pub fn block_range(mut self, net: IpNet) -> Self {
        self.extra_blocked.push(net);
        self
    }

    /// Exempt one exact address from classification.
    pub fn allow_ip(mut self, ip: IpAddr) -> Self {
        self.allowed_private_ips.push(ip.to_canonical());
        self
    }

    /// Build a policy from configuration strings. Every entry must parse.
    pub fn from_strings(blocked: &[String], allowed: &[String]) -> Result<Self, EgressError> {
        let mut policy = Self::new();
        for range in blocked {
            let net = range
                .trim()
                .parse::<IpNet>()
                .map_err(|_| EgressError::InvalidAddress {
                    input: range.clone(),
                })?;
            policy = policy.block_range(net);
        }
        for ip in allowed {
            let ip = ip
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| EgressError::InvalidAddress { input: ip.clone() })?;
            policy = policy.allow_ip(ip);
        }
        Ok(policy)
    }

    /// Classify under this policy. `None` means the address may be dialed.
    pub fn check(&self, ip: IpAddr) -> Option<NonPublicReason> {
        let canonical = ip.to_canonical();
        if self.allowed_private_ips.contains(&canonical) {
            info!(ip = %canonical, "allowing configured private IP");
            return None;
        }
        if self.extra_blocked.iter().any(|net| net.contains(&canonical)) {
            return Some(NonPublicReason::Deployment);
        }
        classify(ip)
    }

    /// True when [`AddressPolicy::check`] accepts the address.
    pub fn is_public(&self, ip: IpAddr) -> bool {
        self.check(ip).is_none()
    }

    /// Whether any deployment additions are configured.
    pub fn is_default(&self) -> bool {
        self.extra_blocked.is_empty() && self.allowed_private_ips.is_empty()
    }
}
