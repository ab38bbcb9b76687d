use crate::common::{authority_host, compile_wildcard};
use http::Uri;
use regex::Regex;
use std::fmt::{Display, Formatter};

const PROTOCOL_ENDING: &str = "://";

/// Matches the host of a URI against a `*` wildcard, optionally restricted
/// to one scheme (`http://192.168.0.*`).
#[derive(Debug, Clone)]
pub struct HostnameFilter {
    literal: String,
    pattern: Regex,
    protocol: Option<String>,
}

impl HostnameFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let literal = pattern.trim().to_lowercase();
        let (protocol, host_pattern) = match literal.find(PROTOCOL_ENDING) {
            Some(idx) => (
                Some(literal[..idx].to_string()),
                &literal[idx + PROTOCOL_ENDING.len()..],
            ),
            None => (None, literal.as_str()),
        };
        let pattern = compile_wildcard(host_pattern)?;
        Ok(Self {
            pattern,
            protocol,
            literal,
        })
    }

    pub fn accept(&self, uri: &Uri) -> bool {
        let Some(authority) = uri.authority() else {
            return false;
        };
        if !self.protocol_matches(uri) {
            return false;
        }
        let host = authority_host(authority.as_str()).to_lowercase();
        self.pattern.is_match(&host)
    }

    fn protocol_matches(&self, uri: &Uri) -> bool {
        match (&self.protocol, uri.scheme_str()) {
            (Some(protocol), Some(scheme)) => scheme.eq_ignore_ascii_case(protocol),
            _ => true,
        }
    }
}

impl Display for HostnameFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.literal)
    }
}
