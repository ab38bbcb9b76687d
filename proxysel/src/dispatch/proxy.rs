use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_SOCKS_PORT: u16 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Http,
    Socks,
}

impl ProxyKind {
    pub fn default_port(&self) -> u16 {
        match self {
            ProxyKind::Http => DEFAULT_HTTP_PORT,
            ProxyKind::Socks => DEFAULT_SOCKS_PORT,
        }
    }
}

impl Display for ProxyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProxyKind::Http => "HTTP",
            ProxyKind::Socks => "SOCKS",
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Empty proxy host")]
    EmptyHost,
    #[error("Invalid proxy port: {0}")]
    InvalidPort(String),
}

/// A proxy server. The host is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProxyEndpoint {
    kind: ProxyKind,
    host: String,
    port: u16,
}

impl ProxyEndpoint {
    pub fn new<S: Into<String>>(kind: ProxyKind, host: S, port: u16) -> Result<Self, EndpointError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        Ok(Self { kind, host, port })
    }

    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`; the kind's
    /// standard port is used when none is given.
    pub fn parse(kind: ProxyKind, s: &str) -> Result<Self, EndpointError> {
        let s = s.trim();
        let (host, port) = match (s.rfind(':'), s.rfind(']')) {
            (Some(colon), Some(bracket)) if colon > bracket => (&s[..colon], Some(&s[colon + 1..])),
            // bare IPv6 without brackets carries no port
            (Some(colon), None) if s[..colon].contains(':') => (s, None),
            (Some(colon), None) => (&s[..colon], Some(&s[colon + 1..])),
            _ => (s, None),
        };
        let port = match port.map(str::trim) {
            None | Some("") => kind.default_port(),
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| EndpointError::InvalidPort(p.to_string()))?,
        };
        Self::new(kind, crate::common::clean_ipv6(host), port)
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Display for ProxyEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "{} [{}]:{}", self.kind, self.host, self.port)
        } else {
            write!(f, "{} {}:{}", self.kind, self.host, self.port)
        }
    }
}

/// One candidate route for a request: a direct connection or a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProxySpec {
    Direct,
    Proxy(ProxyEndpoint),
}

impl ProxySpec {
    pub fn http<S: Into<String>>(host: S, port: u16) -> Result<Self, EndpointError> {
        ProxyEndpoint::new(ProxyKind::Http, host, port).map(Self::Proxy)
    }

    pub fn socks<S: Into<String>>(host: S, port: u16) -> Result<Self, EndpointError> {
        ProxyEndpoint::new(ProxyKind::Socks, host, port).map(Self::Proxy)
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ProxySpec::Direct)
    }

    pub fn endpoint(&self) -> Option<&ProxyEndpoint> {
        match self {
            ProxySpec::Direct => None,
            ProxySpec::Proxy(e) => Some(e),
        }
    }
}

/// Renders the spec in PAC directive form, e.g. `PROXY host:8080` or `DIRECT`.
impl Display for ProxySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxySpec::Direct => f.write_str("DIRECT"),
            ProxySpec::Proxy(e) => {
                let keyword = match e.kind {
                    ProxyKind::Http => "PROXY",
                    ProxyKind::Socks => "SOCKS",
                };
                if e.host.contains(':') {
                    write!(f, "{} [{}]:{}", keyword, e.host, e.port)
                } else {
                    write!(f, "{} {}:{}", keyword, e.host, e.port)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parse() {
        let e = ProxyEndpoint::parse(ProxyKind::Http, "proxy.example:8080").unwrap();
        assert_eq!((e.host(), e.port()), ("proxy.example", 8080));
        let e = ProxyEndpoint::parse(ProxyKind::Http, "proxy.example").unwrap();
        assert_eq!(e.port(), 80);
        let e = ProxyEndpoint::parse(ProxyKind::Socks, "socks.example").unwrap();
        assert_eq!(e.port(), 1080);
        let e = ProxyEndpoint::parse(ProxyKind::Http, "[2001:db8::1]:3128").unwrap();
        assert_eq!((e.host(), e.port()), ("2001:db8::1", 3128));
        let e = ProxyEndpoint::parse(ProxyKind::Http, "[2001:db8::1]").unwrap();
        assert_eq!((e.host(), e.port()), ("2001:db8::1", 80));
        assert_eq!(
            ProxyEndpoint::parse(ProxyKind::Http, ":8080"),
            Err(EndpointError::EmptyHost)
        );
        assert!(matches!(
            ProxyEndpoint::parse(ProxyKind::Http, "host:70000"),
            Err(EndpointError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_structural_eq() {
        assert_eq!(
            ProxySpec::http("a", 1).unwrap(),
            ProxySpec::http("a", 1).unwrap()
        );
        assert_ne!(
            ProxySpec::http("a", 1).unwrap(),
            ProxySpec::socks("a", 1).unwrap()
        );
        assert_ne!(ProxySpec::http("a", 1).unwrap(), ProxySpec::Direct);
    }

    #[test]
    fn test_display() {
        assert_eq!(ProxySpec::Direct.to_string(), "DIRECT");
        assert_eq!(ProxySpec::http("a", 1).unwrap().to_string(), "PROXY a:1");
        assert_eq!(
            ProxySpec::socks("::1", 1080).unwrap().to_string(),
            "SOCKS [::1]:1080"
        );
    }
}
