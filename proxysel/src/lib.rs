//! Decides which proxies (or a direct connection) to use for a request URI.
//!
//! Sources are combined into a [`ListSelector`](dispatch::ListSelector):
//! PAC scripts evaluated with QuickJS, per-protocol proxy tables, bypass
//! lists and a fallback. [`SelectorFactory`](app::SelectorFactory) builds
//! the tree from configuration providers.

pub mod app;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod external;
pub mod filter;
pub mod pac;
