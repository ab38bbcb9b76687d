mod resolve;
mod wildcard;

pub use resolve::*;
pub use wildcard::*;

/// Strips the square brackets around an IPv6 literal, e.g. `[2001:4860::68]`
/// becomes `2001:4860::68`. Anything else is only trimmed.
pub fn clean_ipv6(host: &str) -> &str {
    let host = host.trim();
    let host = host.strip_prefix('[').unwrap_or(host);
    host.strip_suffix(']').unwrap_or(host)
}

/// Host part of an authority: userinfo dropped, port stripped when the last
/// colon is not inside a bracketed IPv6 literal.
pub fn authority_host(authority: &str) -> &str {
    let host = match authority.rfind('@') {
        Some(idx) => &authority[idx + 1..],
        None => authority,
    };
    match (host.rfind(':'), host.rfind(']')) {
        (Some(colon), Some(bracket)) if colon > bracket => &host[..colon],
        (Some(colon), None) => &host[..colon],
        _ => host,
    }
}
