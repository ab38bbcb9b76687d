use crate::common::{lookup_host, to_ipv6};
use http::Uri;
use ipnet::Ipv6Net;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;

const IPV6_BITS: u8 = 128;
const IPV4_BITS: u8 = 32;

/// Matches hosts whose address falls in a CIDR range such as `192.0.2.0/24`
/// or `2001:db8::/32`. Every range is compared on an IPv6 basis: IPv4 ranges
/// and candidates are mapped into `::ffff:0:0/96` first.
///
/// The range is normalized once on construction. A range that cannot be
/// parsed or resolved never matches anything.
#[derive(Debug, Clone)]
pub struct IpRangeFilter {
    literal: String,
    network: Option<Ipv6Net>,
}

impl IpRangeFilter {
    pub fn new(range: &str) -> Self {
        let network = Self::normalize(range);
        if network.is_none() {
            tracing::warn!("Invalid IP range {}, it will match nothing", range);
        }
        Self {
            literal: range.trim().to_string(),
            network,
        }
    }

    fn normalize(range: &str) -> Option<Ipv6Net> {
        let parts: Vec<&str> = range.split('/').collect();
        let [addr, bits] = parts.as_slice() else {
            return None;
        };
        let addr = addr.trim();
        let mut prefix_len = bits.trim().parse::<u8>().ok()?;
        let resolved = lookup_host(addr)?;
        if resolved.is_ipv4() && !addr.contains(':') {
            prefix_len = prefix_len.checked_add(IPV6_BITS - IPV4_BITS)?;
        }
        // rejects prefixes longer than 128 bits
        Ipv6Net::new(to_ipv6(resolved), prefix_len).ok()
    }

    /// The normalized 16-byte network and its prefix length, if valid.
    pub fn network(&self) -> Option<([u8; 16], u8)> {
        self.network
            .map(|net| (net.addr().octets(), net.prefix_len()))
    }

    pub fn accept(&self, uri: &Uri) -> bool {
        uri.host().is_some_and(|host| self.accepts_host(host))
    }

    pub fn accepts_host(&self, host: &str) -> bool {
        let Some(network) = self.network else {
            return false;
        };
        match lookup_host(host) {
            Some(addr) => Self::contains(&network, addr),
            None => false,
        }
    }

    fn contains(network: &Ipv6Net, addr: IpAddr) -> bool {
        // prefix bits of the network address are compared, host bits ignored
        network.contains(&to_ipv6(addr))
    }
}

impl Display for IpRangeFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_range() {
        let filter = IpRangeFilter::new("192.168.0.0/24");
        assert!(filter.accepts_host("192.168.0.100"));
        assert!(!filter.accepts_host("192.168.1.100"));
        assert!(filter.accept(&Uri::from_static("http://192.168.0.100:81/test.data")));
        assert!(!filter.accept(&Uri::from_static("http://192.168.1.100:81/test.data")));
    }

    #[test]
    fn test_ipv4_normalized_to_mapped() {
        let filter = IpRangeFilter::new("192.168.0.0/24");
        let (addr, prefix) = filter.network().unwrap();
        assert_eq!(prefix, 120);
        assert_eq!(addr[..10], [0u8; 10]);
        assert_eq!(addr[10..12], [0xff, 0xff]);
        assert_eq!(addr[12..], [192, 168, 0, 0]);
    }

    #[test]
    fn test_ipv6_range() {
        let filter = IpRangeFilter::new("2001:4860:0:2001::/24");
        assert!(filter.accepts_host("2001:4860:0:2001::68"));
        assert!(!filter.accepts_host("3001:4860:0:2001::68"));
        assert!(filter.accept(&Uri::from_static("http://[2001:4860:0:2001::68]:81/test.data")));
        assert!(!filter.accept(&Uri::from_static("http://[3001:4860:0:2001::68]:81/test.data")));
    }

    #[test]
    fn test_ipv4_mapped_range() {
        let filter = IpRangeFilter::new("::ffff:192.1.8.2/128");
        assert!(filter.accepts_host("::ffff:192.1.8.2"));
        assert!(!filter.accepts_host("::ffff:192.1.8.3"));
        // a plain IPv4 candidate is mapped before comparison
        assert!(filter.accepts_host("192.1.8.2"));

        let filter = IpRangeFilter::new("::ffff:192.0.2.0/120");
        assert!(filter.accepts_host("::ffff:192.0.2.1"));
        assert!(!filter.accepts_host("::ffff:192.0.1.1"));
    }

    #[test]
    fn test_prefix_boundaries() {
        assert!(IpRangeFilter::new("::ffff:255.255.255.255/95").accepts_host("::ffff:0.0.0.0"));
        assert!(IpRangeFilter::new("::ffff:255.255.255.255/96").accepts_host("::ffff:0.0.0.0"));
        assert!(!IpRangeFilter::new("::ffff:255.255.255.255/97").accepts_host("::ffff:0.0.0.0"));
        assert!(IpRangeFilter::new("::ffff:255.255.255.255/128")
            .accepts_host("::ffff:255.255.255.255"));
        assert!(!IpRangeFilter::new("::ffff:255.255.255.255/128")
            .accepts_host("::ffff:255.255.255.254"));
        assert!(IpRangeFilter::new("::/0").accepts_host("10.1.2.3"));
        assert!(IpRangeFilter::new("0.0.0.0/0").accepts_host("10.1.2.3"));
        assert!(!IpRangeFilter::new("0.0.0.0/0").accepts_host("2001:db8::1"));
    }

    #[test]
    fn test_invalid_range_fails_closed() {
        for range in ["192.168.0.0", "192.168.0.0/24/1", "192.168.0.0/abc", "/24"] {
            let filter = IpRangeFilter::new(range);
            assert!(filter.network().is_none(), "{}", range);
            assert!(!filter.accepts_host("192.168.0.1"));
        }
    }

    #[test]
    fn test_overlong_prefix_fails_closed() {
        for range in ["10.0.0.0/33", "10.0.0.0/255", "::ffff:10.0.0.0/129", "2001:db8::/200"] {
            let filter = IpRangeFilter::new(range);
            assert!(filter.network().is_none(), "{}", range);
            assert!(!filter.accepts_host("10.0.0.0"));
        }
        assert_eq!(IpRangeFilter::new("10.0.0.0/32").network().map(|n| n.1), Some(128));
    }
}
