use crate::dispatch::{ProxyEndpoint, ProxyKind, ProxySpec};

/// Parses the `;` separated directive list a PAC function returns, e.g.
/// `"PROXY a:8080; SOCKS5 b:1080; DIRECT"`. Unknown or malformed entries are
/// skipped.
pub fn parse_pac_result(result: &str) -> Vec<ProxySpec> {
    let mut specs = Vec::new();
    for entry in result.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match parse_directive(entry) {
            Some(spec) => specs.push(spec),
            None => tracing::debug!("Ignored PAC directive \"{}\"", entry),
        }
    }
    specs
}

fn parse_directive(entry: &str) -> Option<ProxySpec> {
    let mut parts = entry.split_whitespace();
    let directive = parts.next()?.to_ascii_uppercase();
    let target = parts.next();
    let kind = match directive.as_str() {
        "DIRECT" => return Some(ProxySpec::Direct),
        "PROXY" | "HTTP" | "HTTPS" => ProxyKind::Http,
        "SOCKS" | "SOCKS4" | "SOCKS5" => ProxyKind::Socks,
        _ => return None,
    };
    ProxyEndpoint::parse(kind, target?).ok().map(ProxySpec::Proxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result() {
        assert_eq!(
            parse_pac_result("PROXY a:8080; SOCKS5 b:1080;DIRECT"),
            vec![
                ProxySpec::http("a", 8080).unwrap(),
                ProxySpec::socks("b", 1080).unwrap(),
                ProxySpec::Direct,
            ]
        );
        assert_eq!(
            parse_pac_result("proxy a; socks b; https c:443"),
            vec![
                ProxySpec::http("a", 80).unwrap(),
                ProxySpec::socks("b", 1080).unwrap(),
                ProxySpec::http("c", 443).unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_result_ipv6() {
        assert_eq!(
            parse_pac_result("PROXY [2001:db8::1]:3128"),
            vec![ProxySpec::http("2001:db8::1", 3128).unwrap()]
        );
    }

    #[test]
    fn test_parse_result_garbage() {
        assert!(parse_pac_result("").is_empty());
        assert!(parse_pac_result(" ; ;").is_empty());
        assert_eq!(
            parse_pac_result("BOGUS x:1; PROXY; PROXY a:notaport; DIRECT"),
            vec![ProxySpec::Direct]
        );
    }
}
