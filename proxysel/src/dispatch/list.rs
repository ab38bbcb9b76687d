use crate::dispatch::{ProxySelector, ProxySpec, SelectError};
use http::Uri;
use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;

/// Asks every child selector in order and merges their answers.
///
/// The fallback selector is only consulted when no child produced a
/// candidate. A direct connection is always offered last, and duplicates are
/// removed keeping the first occurrence.
#[derive(Default)]
pub struct ListSelector {
    selectors: Vec<Box<dyn ProxySelector>>,
    fallback: Option<Box<dyn ProxySelector>>,
}

impl ListSelector {
    pub fn new(
        selectors: Vec<Box<dyn ProxySelector>>,
        fallback: Option<Box<dyn ProxySelector>>,
    ) -> Self {
        Self {
            selectors,
            fallback,
        }
    }

    pub fn push(&mut self, selector: Box<dyn ProxySelector>) {
        self.selectors.push(selector);
    }

    pub fn set_fallback(&mut self, selector: Box<dyn ProxySelector>) {
        self.fallback = Some(selector);
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Never fails and never returns an empty list.
    pub fn select_all(&self, uri: &Uri) -> Vec<ProxySpec> {
        let mut proxies = Vec::new();
        for selector in &self.selectors {
            proxies.extend(Self::collect(selector.as_ref(), uri));
        }
        if proxies.is_empty() {
            if let Some(fallback) = &self.fallback {
                proxies.extend(Self::collect(fallback.as_ref(), uri));
            }
        }
        proxies.push(ProxySpec::Direct);
        let proxies = remove_duplicates(proxies);
        tracing::debug!(
            "{} => [{}]",
            uri,
            proxies
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        );
        proxies
    }

    fn collect(selector: &dyn ProxySelector, uri: &Uri) -> Vec<ProxySpec> {
        match selector.select(uri) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Selector {} failed for {}: {}", selector.name(), uri, e);
                vec![]
            }
        }
    }
}

impl ProxySelector for ListSelector {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        Ok(self.select_all(uri))
    }

    fn connect_failed(&self, uri: &Uri, addr: SocketAddr, err: &io::Error) {
        for selector in &self.selectors {
            selector.connect_failed(uri, addr, err);
        }
        if let Some(fallback) = &self.fallback {
            fallback.connect_failed(uri, addr, err);
        }
    }

    fn name(&self) -> &str {
        "list"
    }
}

fn remove_duplicates(proxies: Vec<ProxySpec>) -> Vec<ProxySpec> {
    let mut seen = HashSet::with_capacity(proxies.len());
    proxies
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
