use crate::dispatch::{ProxySelector, ProxySpec, SelectError};
use http::Uri;
use std::collections::HashMap;

/// Picks a proxy by URI scheme, with one fallback for unknown schemes.
#[derive(Debug, Clone, Default)]
pub struct ProtocolDispatchSelector {
    table: HashMap<String, ProxySpec>,
    fallback: Option<ProxySpec>,
}

impl ProtocolDispatchSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_selector(&mut self, scheme: &str, spec: ProxySpec) {
        self.table.insert(scheme.to_ascii_lowercase(), spec);
    }

    pub fn remove_selector(&mut self, scheme: &str) -> Option<ProxySpec> {
        self.table.remove(&scheme.to_ascii_lowercase())
    }

    pub fn set_fallback(&mut self, spec: ProxySpec) {
        self.fallback = Some(spec);
    }

    pub fn get_selector(&self, scheme: &str) -> Option<&ProxySpec> {
        self.table.get(&scheme.to_ascii_lowercase())
    }

    pub fn get_fallback(&self) -> Option<&ProxySpec> {
        self.fallback.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.fallback.is_none()
    }
}

impl ProxySelector for ProtocolDispatchSelector {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        let spec = uri
            .scheme_str()
            .and_then(|scheme| self.get_selector(scheme))
            .or(self.fallback.as_ref());
        Ok(spec.cloned().into_iter().collect())
    }

    fn name(&self) -> &str {
        "protocol"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        let mut selector = ProtocolDispatchSelector::new();
        let http = ProxySpec::http("http_proxy", 8090).unwrap();
        let fallback = ProxySpec::http("fallback_proxy", 3128).unwrap();
        selector.set_selector("HTTP", http.clone());
        assert_eq!(
            selector.select(&Uri::from_static("http://x/")).unwrap(),
            vec![http.clone()]
        );
        assert_eq!(
            selector.select(&Uri::from_static("HTTP://x/")).unwrap(),
            vec![http.clone()]
        );
        assert!(selector
            .select(&Uri::from_static("ftp://x/"))
            .unwrap()
            .is_empty());

        selector.set_fallback(fallback.clone());
        assert_eq!(
            selector.select(&Uri::from_static("ftp://x/")).unwrap(),
            vec![fallback.clone()]
        );
        // no scheme at all goes to the fallback as well
        assert_eq!(
            selector.select(&Uri::from_static("x:21")).unwrap(),
            vec![fallback]
        );
    }
}
