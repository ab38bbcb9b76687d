mod bypass;
mod fixed;
mod list;
mod protocol;
mod proxy;
mod shared;

pub use bypass::*;
pub use fixed::*;
pub use list::*;
pub use protocol::*;
pub use proxy::*;
pub use shared::*;

use crate::pac::ScriptEvaluationError;
use http::Uri;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("PAC evaluation failed: {0}")]
    Script(#[from] ScriptEvaluationError),
    #[error("Selector {0} failed: {1}")]
    Other(String, String),
}

/// Decides which proxies may be used to reach a URI.
///
/// Selectors are built up front and then shared read-only across threads;
/// configuration methods take `&mut self`.
pub trait ProxySelector: Send + Sync {
    /// Candidates in priority order. An empty list means this selector has no
    /// opinion about the URI.
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError>;

    /// Notifies the selector that connecting through `addr` failed.
    fn connect_failed(&self, uri: &Uri, addr: SocketAddr, err: &io::Error) {
        tracing::debug!("Connection to {} for {} failed: {}", addr, uri, err);
    }

    /// Short name used in logs.
    fn name(&self) -> &str;
}

impl<T: ProxySelector + ?Sized> ProxySelector for Box<T> {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        (**self).select(uri)
    }

    fn connect_failed(&self, uri: &Uri, addr: SocketAddr, err: &io::Error) {
        (**self).connect_failed(uri, addr, err)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
