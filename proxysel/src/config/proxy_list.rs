use crate::common::clean_ipv6;
use crate::config::ConfigParseError;
use crate::dispatch::{ProtocolDispatchSelector, ProxyEndpoint, ProxyKind, ProxySpec};

pub const DEFAULT_KEY: &str = "default";
pub const SOCKS_KEY: &str = "socks";
const KNOWN_KEYS: [&str; 6] = ["http", "https", "ftp", "gopher", SOCKS_KEY, DEFAULT_KEY];

/// Splits `key=value` pairs separated by `;` or newlines. A list without any
/// `=` is a single proxy used for every protocol.
pub fn parse_proxy_list(list: &str) -> Vec<(String, String)> {
    let list = list.trim();
    if list.is_empty() {
        return vec![];
    }
    if !list.contains('=') {
        return vec![(DEFAULT_KEY.to_string(), list.to_string())];
    }
    let mut entries = Vec::new();
    for entry in list.split([';', '\n']).map(str::trim).filter(|e| !e.is_empty()) {
        match parse_entry(entry) {
            Ok(pair) => entries.push(pair),
            Err(e) => tracing::warn!("Skipping proxy entry: {}", e),
        }
    }
    entries
}

fn parse_entry(entry: &str) -> Result<(String, String), ConfigParseError> {
    let (key, value) = entry
        .split_once('=')
        .ok_or_else(|| ConfigParseError::MissingSeparator(entry.to_string()))?;
    let key = key.trim().to_ascii_lowercase();
    if !KNOWN_KEYS.contains(&key.as_str()) {
        return Err(ConfigParseError::UnknownProtocol(key));
    }
    Ok((key, value.trim().to_string()))
}

/// Parses one proxy setting such as `proxy:8080`, `http://[::1]:3128` or
/// `socks5://s:1080`. Without a scheme `http://` is assumed; a `socks*`
/// scheme overrides `kind`.
pub fn parse_proxy_settings(kind: ProxyKind, setting: &str) -> Result<ProxySpec, ConfigParseError> {
    let setting = setting.trim();
    let with_scheme = if setting.contains("://") {
        setting.to_string()
    } else {
        format!("http://{}", setting)
    };
    let url = url::Url::parse(&with_scheme)
        .map_err(|e| ConfigParseError::Url(setting.to_string(), e))?;
    let kind = if url.scheme().starts_with("socks") {
        ProxyKind::Socks
    } else {
        kind
    };
    let host = url
        .host_str()
        .map(clean_ipv6)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConfigParseError::MissingHost(setting.to_string()))?;
    let port = match kind {
        ProxyKind::Http => url.port_or_known_default().unwrap_or(kind.default_port()),
        ProxyKind::Socks => url.port().unwrap_or(kind.default_port()),
    };
    ProxyEndpoint::new(kind, host, port)
        .map(ProxySpec::Proxy)
        .map_err(|e| ConfigParseError::Endpoint(setting.to_string(), e))
}

/// Builds the per-protocol table from a proxy list. `default` becomes the
/// fallback unless a `socks` entry is present, which takes precedence.
pub fn build_protocol_dispatch_selector(list: &str) -> ProtocolDispatchSelector {
    let mut selector = ProtocolDispatchSelector::new();
    let mut default = None;
    let mut socks = None;
    for (key, value) in parse_proxy_list(list) {
        let kind = if key == SOCKS_KEY {
            ProxyKind::Socks
        } else {
            ProxyKind::Http
        };
        let spec = match parse_proxy_settings(kind, &value) {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!("Skipping {} proxy: {}", key, e);
                continue;
            }
        };
        match key.as_str() {
            DEFAULT_KEY => default = Some(spec),
            SOCKS_KEY => {
                selector.set_selector(SOCKS_KEY, spec.clone());
                socks = Some(spec);
            }
            _ => selector.set_selector(&key, spec),
        }
    }
    if let Some(fallback) = socks.or(default) {
        selector.set_fallback(fallback);
    }
    selector
}
