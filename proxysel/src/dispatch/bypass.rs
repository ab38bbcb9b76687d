use crate::dispatch::{ProxySelector, ProxySpec, SelectError};
use crate::filter::{parse_bypass_list, UriFilter};
use http::Uri;
use std::io;
use std::net::SocketAddr;

/// Forces a direct connection for every URI accepted by one of its filters
/// and asks the wrapped selector otherwise.
pub struct BypassListSelector<S> {
    filters: Vec<UriFilter>,
    inner: S,
}

impl<S: ProxySelector> BypassListSelector<S> {
    pub fn new(filters: Vec<UriFilter>, inner: S) -> Self {
        Self { filters, inner }
    }

    /// `bypass_list` is a `;` or `,` separated list of hostname wildcards,
    /// CIDR ranges and the special `<local>` entry.
    pub fn from_list(bypass_list: &str, inner: S) -> Self {
        Self::new(parse_bypass_list(bypass_list), inner)
    }

    pub fn filters(&self) -> &[UriFilter] {
        &self.filters
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn is_bypassed(&self, uri: &Uri) -> bool {
        self.filters.iter().any(|f| f.accept(uri))
    }
}

impl<S: ProxySelector> ProxySelector for BypassListSelector<S> {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        if let Some(filter) = self.filters.iter().find(|f| f.accept(uri)) {
            tracing::debug!("[{}] {} => DIRECT", filter, uri);
            return Ok(vec![ProxySpec::Direct]);
        }
        self.inner.select(uri)
    }

    fn connect_failed(&self, uri: &Uri, addr: SocketAddr, err: &io::Error) {
        self.inner.connect_failed(uri, addr, err)
    }

    fn name(&self) -> &str {
        "bypass"
    }
}
