//! Outbound target filtering for the forward proxy.
//!
//! A target is fetched only when its scheme is allow-listed and its host is
//! neither an exact blocked hostname nor starts with a blocked prefix.
//!
//! The prefix check is textual, not CIDR-aware: `172.` also covers public
//! addresses such as `172.217.x.x`, while `169.254.*` link-local and
//! IPv6-mapped private addresses are not covered by the defaults.

use url::{Host, Url};

use crate::config::schema::SsrfConfig;

pub const DEFAULT_ALLOWED_SCHEMES: &[&str] = &["http", "https"];
pub const DEFAULT_BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];
pub const DEFAULT_BLOCKED_PREFIXES: &[&str] = &["192.168.", "10.", "172."];

/// Immutable SSRF policy, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsrfPolicy {
    allowed_schemes: Vec<String>,
    blocked_hosts: Vec<String>,
    blocked_prefixes: Vec<String>,
}

impl SsrfPolicy {
    /// Build a policy. Entries are trimmed and lowercased; schemes may be
    /// given with or without the trailing `:` and hosts with or without
    /// IPv6 brackets.
    pub fn new<S: AsRef<str>>(allowed_schemes: &[S], blocked_hosts: &[S], blocked_prefixes: &[S]) -> Self {
        Self {
            allowed_schemes: clean(allowed_schemes, |s| s.trim_end_matches(':')),
            blocked_hosts: clean(blocked_hosts, |h| h.trim_start_matches('[').trim_end_matches(']')),
            blocked_prefixes: clean(blocked_prefixes, |p| p),
        }
    }

    pub fn from_config(config: &SsrfConfig) -> Self {
        Self::new(
            config.allowed_schemes.as_slice(),
            config.blocked_hosts.as_slice(),
            config.blocked_prefixes.as_slice(),
        )
    }
}

fn clean<S: AsRef<str>>(values: &[S], strip: fn(&str) -> &str) -> Vec<String> {
    values
        .iter()
        .map(|v| strip(v.as_ref().trim()).to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

impl Default for SsrfPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_SCHEMES, DEFAULT_BLOCKED_HOSTS, DEFAULT_BLOCKED_PREFIXES)
    }
}

/// Why a target was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Unparsable,
    Scheme,
    MissingHost,
    BlockedHost,
    BlockedPrefix,
}

impl BlockReason {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Unparsable => "unparsable",
            BlockReason::Scheme => "scheme",
            BlockReason::MissingHost => "missing_host",
            BlockReason::BlockedHost => "blocked_host",
            BlockReason::BlockedPrefix => "blocked_prefix",
        }
    }
}

/// Result of an SSRF check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsrfVerdict {
    Allow,
    Block(BlockReason),
}

impl SsrfVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SsrfVerdict::Allow)
    }
}

/// Whether `url` may be fetched. Parse failures are not allowed.
pub fn is_allowed(url: &str, policy: &SsrfPolicy) -> bool {
    check(url, policy).is_allowed()
}

/// Parse `url` as an absolute URL and check it against `policy`.
pub fn check(url: &str, policy: &SsrfPolicy) -> SsrfVerdict {
    match Url::parse(url) {
        Ok(parsed) => check_url(&parsed, policy),
        Err(_) => SsrfVerdict::Block(BlockReason::Unparsable),
    }
}

/// Check an already parsed URL (also used for redirect hops).
pub fn check_url(url: &Url, policy: &SsrfPolicy) -> SsrfVerdict {
    if !policy.allowed_schemes.iter().any(|s| s == url.scheme()) {
        return SsrfVerdict::Block(BlockReason::Scheme);
    }

    let hostname = match url.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => return SsrfVerdict::Block(BlockReason::MissingHost),
    };

    if policy.blocked_hosts.iter().any(|h| *h == hostname) {
        return SsrfVerdict::Block(BlockReason::BlockedHost);
    }
    if policy.blocked_prefixes.iter().any(|p| hostname.starts_with(p.as_str())) {
        return SsrfVerdict::Block(BlockReason::BlockedPrefix);
    }

    SsrfVerdict::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SsrfPolicy {
        SsrfPolicy::default()
    }

    #[test]
    fn allows_public_https() {
        assert!(is_allowed("https://example.com/", &policy()));
        assert!(is_allowed("http://example.com:8080/a?b=c", &policy()));
    }

    #[test]
    fn blocks_non_http_schemes() {
        assert_eq!(check("ftp://example.com/file", &policy()), SsrfVerdict::Block(BlockReason::Scheme));
        assert_eq!(check("file:///etc/passwd", &policy()), SsrfVerdict::Block(BlockReason::Scheme));
        assert!(!is_allowed("javascript:alert(1)", &policy()));
    }

    #[test]
    fn blocks_unparsable() {
        assert_eq!(check("not a url", &policy()), SsrfVerdict::Block(BlockReason::Unparsable));
        assert_eq!(check("/relative/path", &policy()), SsrfVerdict::Block(BlockReason::Unparsable));
        assert!(!is_allowed("", &policy()));
    }

    #[test]
    fn blocks_exact_hosts() {
        for url in [
            "http://localhost/",
            "http://LOCALHOST:3000/",
            "http://127.0.0.1/",
            "http://0.0.0.0/",
            "http://[::1]:8080/",
        ] {
            assert_eq!(check(url, &policy()), SsrfVerdict::Block(BlockReason::BlockedHost), "{}", url);
        }
    }

    #[test]
    fn blocks_prefixes_textually() {
        for url in ["http://10.0.0.1/", "http://192.168.1.1/", "http://172.16.0.1/", "http://172.217.0.1/"] {
            assert_eq!(check(url, &policy()), SsrfVerdict::Block(BlockReason::BlockedPrefix), "{}", url);
        }
        // Textual matching also catches hostnames that merely start with the prefix.
        assert!(!is_allowed("http://10.example.com/", &policy()));
    }

    #[test]
    fn prefix_list_does_not_cover_link_local() {
        assert!(is_allowed("http://169.254.169.254/latest/meta-data", &policy()));
    }

    #[test]
    fn custom_policy_normalizes_entries() {
        let policy = SsrfPolicy::new(&["HTTPS:"], &[" [::1] ", "Internal.Example"], &[]);
        assert!(!is_allowed("http://example.com/", &policy));
        assert!(is_allowed("https://example.com/", &policy));
        assert!(!is_allowed("https://[::1]/", &policy));
        assert!(!is_allowed("https://internal.example/", &policy));
        assert!(is_allowed("https://10.0.0.1/", &policy));
    }
}
