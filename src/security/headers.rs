//! Header filtering for relayed upstream responses.
//!
//! # Responsibilities
//! - Remove configured response headers (cookies, framing and CSP policy,
//!   CORS grants) before a proxied response reaches the caller
//! - Strip hop-by-hop headers; the edge manages its own connection framing
//!
//! Matching is case-insensitive and never inspects header values.

use axum::http::HeaderMap;

pub const DEFAULT_FILTERED_HEADERS: &[&str] = &[
    "content-security-policy",
    "cookie",
    "set-cookie",
    "x-frame-options",
    "access-control-allow-origin",
];

/// Connection-scoped headers that must not be forwarded (RFC 9110 §7.6.1).
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Strips a fixed block-list of headers from upstream responses.
#[derive(Debug, Clone)]
pub struct ResponseSanitizer {
    blocked: Vec<String>,
}

impl ResponseSanitizer {
    pub fn new<S: AsRef<str>>(block_list: &[S]) -> Self {
        Self {
            blocked: block_list
                .iter()
                .map(|name| name.as_ref().trim().to_ascii_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Whether `name` is on the block-list, ignoring case.
    pub fn is_blocked(&self, name: &str) -> bool {
        self.blocked.iter().any(|b| b.eq_ignore_ascii_case(name))
    }

    /// Copy of `headers` without block-listed names. Everything else,
    /// including repeated values, passes through in order.
    pub fn strip(&self, headers: &HeaderMap) -> HeaderMap {
        retain(headers, |name| !self.is_blocked(name))
    }
}

impl Default for ResponseSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_FILTERED_HEADERS)
    }
}

/// Copy of `headers` without hop-by-hop headers.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    retain(headers, |name| !HOP_BY_HOP_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)))
}

fn retain(headers: &HeaderMap, keep: impl Fn(&str) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if keep(name.as_str()) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn strips_set_cookie_keeps_custom() {
        let input = headers(&[("Set-Cookie", "a=1"), ("X-Custom", "keep")]);
        let out = ResponseSanitizer::default().strip(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("x-custom").unwrap(), "keep");
        assert!(out.get("set-cookie").is_none());
    }

    #[test]
    fn strips_every_default_header() {
        let input = headers(&[
            ("Content-Security-Policy", "default-src 'none'"),
            ("Cookie", "a=1"),
            ("X-Frame-Options", "DENY"),
            ("Access-Control-Allow-Origin", "https://other.example"),
            ("Content-Type", "text/plain"),
        ]);
        let out = ResponseSanitizer::default().strip(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn block_list_is_case_insensitive() {
        let sanitizer = ResponseSanitizer::new(&["X-POWERED-BY", " Server "]);
        assert!(sanitizer.is_blocked("x-powered-by"));
        assert!(sanitizer.is_blocked("SERVER"));
        let out = sanitizer.strip(&headers(&[("x-powered-by", "php"), ("server", "nginx"), ("etag", "\"1\"")]));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn repeated_values_survive() {
        let input = headers(&[("Vary", "Accept"), ("Vary", "Origin"), ("Set-Cookie", "a=1"), ("Set-Cookie", "b=2")]);
        let out = ResponseSanitizer::default().strip(&input);
        let vary: Vec<_> = out.get_all("vary").iter().collect();
        assert_eq!(vary, vec!["Accept", "Origin"]);
        assert!(out.get("set-cookie").is_none());
    }

    #[test]
    fn hop_by_hop_removed() {
        let input = headers(&[("Transfer-Encoding", "chunked"), ("Connection", "close"), ("ETag", "\"x\"")]);
        let out = strip_hop_by_hop(&input);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("etag"));
    }
}
