mod hostname;
mod ip_range;

pub use hostname::*;
pub use ip_range::*;

use http::Uri;
use std::fmt::{Debug, Display, Formatter};

/// A predicate over request URIs used to build bypass lists.
#[derive(Debug, Clone)]
pub enum UriFilter {
    Hostname(HostnameFilter),
    IpRange(IpRangeFilter),
    LocalBypass,
}

impl UriFilter {
    /// Builds a filter from one bypass-list entry: `<local>` bypasses
    /// unqualified hosts, entries containing `/` are CIDR ranges, everything
    /// else is a hostname wildcard.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if token.eq_ignore_ascii_case("<local>") {
            Some(UriFilter::LocalBypass)
        } else if token.contains('/') && !token.contains("://") {
            Some(UriFilter::IpRange(IpRangeFilter::new(token)))
        } else {
            match HostnameFilter::new(token) {
                Ok(f) => Some(UriFilter::Hostname(f)),
                Err(e) => {
                    tracing::warn!("Skipping bypass entry {}: {}", token, e);
                    None
                }
            }
        }
    }

    pub fn accept(&self, uri: &Uri) -> bool {
        match self {
            UriFilter::Hostname(f) => f.accept(uri),
            UriFilter::IpRange(f) => f.accept(uri),
            UriFilter::LocalBypass => accept_local(uri),
        }
    }
}

impl Display for UriFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UriFilter::Hostname(h) => Display::fmt(h, f),
            UriFilter::IpRange(r) => Display::fmt(r, f),
            UriFilter::LocalBypass => f.write_str("<local>"),
        }
    }
}

/// Splits a `;`/`,` separated bypass list into filters, skipping entries
/// that cannot be parsed.
pub fn parse_bypass_list(list: &str) -> Vec<UriFilter> {
    list.split([';', ',', '\n'])
        .filter_map(UriFilter::parse)
        .collect()
}

fn accept_local(uri: &Uri) -> bool {
    uri.authority()
        .is_some_and(|authority| !authority.as_str().contains('.'))
}
