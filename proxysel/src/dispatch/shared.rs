use crate::dispatch::{ListSelector, ProxySelector, ProxySpec, SelectError};
use arc_swap::ArcSwap;
use http::Uri;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

/// A selector tree that can be replaced while other threads keep selecting.
/// Readers always see either the old or the new tree, never a mix.
pub struct SharedSelector {
    current: ArcSwap<ListSelector>,
}

impl SharedSelector {
    pub fn new(selector: ListSelector) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(selector)),
        }
    }

    pub fn replace(&self, selector: ListSelector) {
        self.current.store(Arc::new(selector));
        tracing::info!("Proxy selector reloaded");
    }

    pub fn load(&self) -> Arc<ListSelector> {
        self.current.load_full()
    }

    pub fn select_all(&self, uri: &Uri) -> Vec<ProxySpec> {
        self.current.load().select_all(uri)
    }
}

impl ProxySelector for SharedSelector {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        Ok(self.select_all(uri))
    }

    fn connect_failed(&self, uri: &Uri, addr: SocketAddr, err: &io::Error) {
        self.current.load().connect_failed(uri, addr, err)
    }

    fn name(&self) -> &str {
        "shared"
    }
}

#[test]
fn test_replace() {
    use crate::dispatch::FixedSelector;
    let uri = Uri::from_static("http://x/");
    let shared = SharedSelector::new(ListSelector::default());
    assert_eq!(shared.select_all(&uri), vec![ProxySpec::Direct]);
    let proxy = ProxySpec::socks("socks", 1080).unwrap();
    shared.replace(ListSelector::new(
        vec![Box::new(FixedSelector::new(proxy.clone()))],
        None,
    ));
    assert_eq!(shared.select_all(&uri), vec![proxy, ProxySpec::Direct]);
}
