use crate::common::clean_ipv6;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::Resolver;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

static RESOLVER: OnceLock<Option<Resolver>> = OnceLock::new();

fn resolver() -> Option<&'static Resolver> {
    RESOLVER
        .get_or_init(|| match Resolver::from_system_conf() {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!("System DNS configuration unavailable, using defaults: {}", e);
                match Resolver::new(ResolverConfig::default(), ResolverOpts::default()) {
                    Ok(r) => Some(r),
                    Err(e) => {
                        tracing::warn!("Failed to create DNS resolver: {}", e);
                        None
                    }
                }
            }
        })
        .as_ref()
}

/// Parses an IP literal, with or without IPv6 brackets.
pub fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    clean_ipv6(host).parse().ok()
}

/// Resolves a host name or IP literal. Literals never touch the network;
/// failures are reported as an empty list.
pub fn lookup_all(host: &str) -> Vec<IpAddr> {
    let host = clean_ipv6(host);
    if host.is_empty() {
        return vec![];
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return vec![ip];
    }
    let Some(resolver) = resolver() else {
        return vec![];
    };
    match resolver.lookup_ip(host) {
        Ok(result) => result.iter().collect(),
        Err(e) => {
            tracing::debug!("Failed to resolve {}: {}", host, e);
            vec![]
        }
    }
}

pub fn lookup_host(host: &str) -> Option<IpAddr> {
    lookup_all(host).into_iter().next()
}

/// IPv4 addresses become IPv4-mapped IPv6 (`::ffff:a.b.c.d`).
pub fn to_ipv6(addr: IpAddr) -> Ipv6Addr {
    match addr {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}

/// Addresses of all interfaces that are up, loopback excluded.
pub fn local_addresses() -> Vec<IpAddr> {
    pnet_datalink::interfaces()
        .into_iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback())
        .flat_map(|iface| iface.ips.into_iter().map(|net| net.ip()))
        .collect()
}

/// First non-loopback IPv4 address, or 127.0.0.1.
pub fn primary_ipv4() -> IpAddr {
    local_addresses()
        .into_iter()
        .find(|ip| ip.is_ipv4())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
