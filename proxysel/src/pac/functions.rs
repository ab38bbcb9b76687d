//! Native implementations of the PAC helper library, including Microsoft's
//! IPv6 extensions (`*Ex`). The script engine only forwards to these.

use crate::common::{compile_shell_expr, local_addresses, lookup_all, primary_ipv4};
use crate::filter::IpRangeFilter;
use chrono::{Datelike, Local, NaiveDateTime, Timelike, Utc};
use std::net::{IpAddr, Ipv4Addr};

const GMT: &str = "GMT";
const WEEKDAYS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

pub fn is_plain_host_name(host: &str) -> bool {
    !host.contains('.')
}

pub fn dns_domain_is(host: &str, domain: &str) -> bool {
    host.to_lowercase().ends_with(&domain.to_lowercase())
}

/// Exact match, or `host` is unqualified and equals the first label of
/// `domain`.
pub fn local_host_or_domain_is(host: &str, domain: &str) -> bool {
    if host.eq_ignore_ascii_case(domain) {
        return true;
    }
    !host.contains('.')
        && domain
            .split('.')
            .next()
            .is_some_and(|label| label.eq_ignore_ascii_case(host))
}

pub fn is_resolvable(host: &str) -> bool {
    lookup_all(host).iter().any(IpAddr::is_ipv4)
}

pub fn is_resolvable_ex(host: &str) -> bool {
    !lookup_all(host).is_empty()
}

/// First IPv4 address of `host`.
pub fn dns_resolve(host: &str) -> Option<String> {
    lookup_all(host)
        .into_iter()
        .find(IpAddr::is_ipv4)
        .map(|ip| ip.to_string())
}

/// All addresses of `host`, `;` separated; empty when unresolvable.
pub fn dns_resolve_ex(host: &str) -> String {
    join(lookup_all(host))
}

pub fn my_ip_address() -> String {
    primary_ipv4().to_string()
}

pub fn my_ip_address_ex() -> String {
    join(local_addresses())
}

pub fn is_in_net(host: &str, pattern: &str, mask: &str) -> bool {
    let (Ok(pattern), Ok(mask)) = (
        pattern.trim().parse::<Ipv4Addr>(),
        mask.trim().parse::<Ipv4Addr>(),
    ) else {
        return false;
    };
    let Some(IpAddr::V4(addr)) = lookup_all(host).into_iter().find(IpAddr::is_ipv4) else {
        return false;
    };
    let mask = u32::from(mask);
    u32::from(addr) & mask == u32::from(pattern) & mask
}

/// `prefix` is CIDR notation, IPv4 or IPv6.
pub fn is_in_net_ex(host: &str, prefix: &str) -> bool {
    if !prefix.contains('/') {
        return false;
    }
    IpRangeFilter::new(prefix).accepts_host(host)
}

pub fn dns_domain_levels(host: &str) -> i32 {
    host.matches('.').count() as i32
}

pub fn sh_exp_match(s: &str, pattern: &str) -> bool {
    compile_shell_expr(pattern).is_ok_and(|re| re.is_match(s))
}

/// Sorts a `;` separated address list, IPv6 first. Returns an empty string
/// when any entry is not an IP address.
pub fn sort_ip_address_list(list: &str) -> String {
    let parsed: Result<Vec<IpAddr>, _> = list
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<IpAddr>)
        .collect();
    match parsed {
        Ok(mut addrs) if !addrs.is_empty() => {
            addrs.sort_by_key(|ip| (ip.is_ipv4(), *ip));
            join(addrs)
        }
        _ => String::new(),
    }
}

pub fn get_client_version() -> String {
    "1.0".to_string()
}

fn join(addrs: Vec<IpAddr>) -> String {
    addrs
        .iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Wall clock used by the date/time predicates; `GMT` selects UTC.
#[derive(Debug, Clone, Copy)]
pub struct PacClock {
    local: NaiveDateTime,
    utc: NaiveDateTime,
}

impl PacClock {
    pub fn now() -> Self {
        Self {
            local: Local::now().naive_local(),
            utc: Utc::now().naive_utc(),
        }
    }

    pub fn fixed(at: NaiveDateTime) -> Self {
        Self { local: at, utc: at }
    }

    fn pick(&self, gmt: bool) -> NaiveDateTime {
        if gmt {
            self.utc
        } else {
            self.local
        }
    }
}

fn split_gmt(args: &[String]) -> (&[String], bool) {
    match args.split_last() {
        Some((last, rest)) if last.trim().eq_ignore_ascii_case(GMT) => (rest, true),
        _ => (args, false),
    }
}

fn in_range<T: PartialOrd>(start: T, current: T, end: T) -> bool {
    if start <= end {
        start <= current && current <= end
    } else {
        // wraps around, e.g. FRI..MON or 22h..6h
        current >= start || current <= end
    }
}

pub fn weekday_range(args: &[String], clock: &PacClock) -> bool {
    let (args, gmt) = split_gmt(args);
    let today = clock.pick(gmt).weekday().num_days_from_sunday() as usize;
    let day = |s: &String| WEEKDAYS.iter().position(|d| d.eq_ignore_ascii_case(s.trim()));
    match args {
        [wd1] => day(wd1) == Some(today),
        [wd1, wd2] => match (day(wd1), day(wd2)) {
            (Some(start), Some(end)) => in_range(start, today, end),
            _ => false,
        },
        _ => false,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct DateSpec {
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
}

impl DateSpec {
    /// Each token sets one field; a field given twice is invalid.
    fn parse(tokens: &[String]) -> Option<Self> {
        let mut spec = DateSpec::default();
        for token in tokens {
            let token = token.trim();
            let month = MONTHS.iter().position(|m| m.eq_ignore_ascii_case(token));
            let duplicate = if let Some(m) = month {
                spec.month.replace(m as u32 + 1).is_some()
            } else {
                match token.parse::<i32>().ok()? {
                    n @ 1..=31 => spec.day.replace(n as u32).is_some(),
                    n if n > 31 => spec.year.replace(n).is_some(),
                    _ => return None,
                }
            };
            if duplicate {
                return None;
            }
        }
        Some(spec)
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.day.is_some() == other.day.is_some()
            && self.month.is_some() == other.month.is_some()
            && self.year.is_some() == other.year.is_some()
    }

    /// Comparable key restricted to the fields this spec sets.
    fn key(&self) -> i64 {
        self.year.unwrap_or(0) as i64 * 10_000
            + self.month.unwrap_or(0) as i64 * 100
            + self.day.unwrap_or(0) as i64
    }

    fn project(&self, now: &NaiveDateTime) -> Self {
        DateSpec {
            day: self.day.map(|_| now.day()),
            month: self.month.map(|_| now.month()),
            year: self.year.map(|_| now.year()),
        }
    }
}

pub fn date_range(args: &[String], clock: &PacClock) -> bool {
    let (args, gmt) = split_gmt(args);
    let now = clock.pick(gmt);
    match args.len() {
        1 => DateSpec::parse(args).is_some_and(|spec| spec.project(&now) == spec),
        2 | 4 | 6 => {
            let (start, end) = args.split_at(args.len() / 2);
            match (DateSpec::parse(start), DateSpec::parse(end)) {
                (Some(start), Some(end)) if start.same_fields(&end) => {
                    in_range(start.key(), start.project(&now).key(), end.key())
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn hour(h: u32) -> Option<u32> {
    (h < 24).then_some(h)
}

/// Seconds since midnight; `None` for components outside a day.
fn seconds(h: u32, m: u32, s: u32) -> Option<u32> {
    (h < 24 && m < 60 && s < 60).then(|| h * 3600 + m * 60 + s)
}

pub fn time_range(args: &[String], clock: &PacClock) -> bool {
    let (args, gmt) = split_gmt(args);
    let now = clock.pick(gmt);
    let Ok(nums) = args
        .iter()
        .map(|s| s.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
    else {
        return false;
    };
    let current = now.num_seconds_from_midnight();
    let range = |start: Option<u32>, end: Option<u32>| match (start, end) {
        (Some(start), Some(end)) => in_range(start, current, end),
        _ => false,
    };
    match nums.as_slice() {
        [h] => hour(*h) == Some(now.hour()),
        [h1, h2] => match (hour(*h1), hour(*h2)) {
            (Some(h1), Some(h2)) => in_range(h1, now.hour(), h2),
            _ => false,
        },
        [h1, m1, h2, m2] => range(seconds(*h1, *m1, 0), seconds(*h2, *m2, 59)),
        [h1, m1, s1, h2, m2, s2] => range(seconds(*h1, *m1, *s1), seconds(*h2, *m2, *s2)),
        _ => false,
    }
}
