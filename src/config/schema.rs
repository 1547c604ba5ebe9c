//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::security::headers::DEFAULT_FILTERED_HEADERS;
use crate::security::ssrf::{DEFAULT_ALLOWED_SCHEMES, DEFAULT_BLOCKED_HOSTS, DEFAULT_BLOCKED_PREFIXES};

/// Root configuration for the edge handler.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Static files and page templates.
    pub site: SiteConfig,

    /// Forward proxy settings.
    pub proxy: ProxyConfig,

    /// Outbound target filtering.
    pub ssrf: SsrfConfig,

    /// Upstream response header filtering.
    pub sanitizer: SanitizerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Project root and page routing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory bounding every file read.
    pub root: PathBuf,

    /// Token in page templates replaced by the password digest.
    pub password_placeholder: String,

    /// Files larger than this are not served.
    pub max_file_bytes: u64,

    /// `Cache-Control` for static assets.
    pub static_cache_control: String,

    /// `Cache-Control` for rendered pages.
    pub page_cache_control: String,

    /// Named page routes.
    pub pages: Vec<PageConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            password_placeholder: "{{PASSWORD}}".to_string(),
            max_file_bytes: 64 * 1024 * 1024,
            static_cache_control: "public, max-age=31536000, immutable".to_string(),
            page_cache_control: "no-cache".to_string(),
            pages: default_pages(),
        }
    }
}

/// A page template and the request paths that render it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Template file, relative to the project root.
    pub template: String,

    /// Exact request paths.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Request path prefixes.
    #[serde(default)]
    pub prefixes: Vec<String>,
}

impl PageConfig {
    fn new(name: &str, template: &str, paths: &[&str], prefixes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            template: template.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }
}

fn default_pages() -> Vec<PageConfig> {
    vec![
        PageConfig::new("index", "index.html", &["/", "/index.html"], &["/s="]),
        PageConfig::new("player", "player.html", &["/player", "/player.html"], &["/player/"]),
        PageConfig::new("watch", "watch.html", &["/watch.html"], &[]),
        PageConfig::new("about", "about.html", &["/about.html"], &[]),
    ]
}

/// Forward proxy configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// First path segment selecting the proxy route.
    pub prefix: String,

    /// Shared secret. Empty disables proxying.
    pub password: String,

    /// User-Agent sent upstream.
    pub user_agent: String,

    /// Deadline for the upstream response headers, in milliseconds.
    pub timeout_ms: u64,

    /// Maximum age of a signed auth timestamp, in milliseconds.
    pub auth_max_age_ms: i64,

    /// Redirect hops followed upstream (each hop is SSRF-checked).
    pub max_redirects: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: "proxy".to_string(),
            password: String::new(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            timeout_ms: 5_000,
            auth_max_age_ms: 600_000,
            max_redirects: 5,
        }
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("prefix", &self.prefix)
            .field("password", &if self.password.is_empty() { "<unset>" } else { "<redacted>" })
            .field("user_agent", &self.user_agent)
            .field("timeout_ms", &self.timeout_ms)
            .field("auth_max_age_ms", &self.auth_max_age_ms)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

/// SSRF policy lists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SsrfConfig {
    pub allowed_schemes: Vec<String>,

    /// Exact hostnames never fetched.
    pub blocked_hosts: Vec<String>,

    /// Hostname prefixes never fetched (textual, not CIDR).
    pub blocked_prefixes: Vec<String>,
}

impl Default for SsrfConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: to_strings(DEFAULT_ALLOWED_SCHEMES),
            blocked_hosts: to_strings(DEFAULT_BLOCKED_HOSTS),
            blocked_prefixes: to_strings(DEFAULT_BLOCKED_PREFIXES),
        }
    }
}

/// Upstream response header filtering.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Header names removed from relayed responses (case-insensitive).
    pub filtered_headers: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            filtered_headers: to_strings(DEFAULT_FILTERED_HEADERS),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce response headers, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `X-Content-Type-Options: nosniff` to static and page responses.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: EdgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.proxy.timeout_ms, 5_000);
        assert_eq!(config.proxy.auth_max_age_ms, 600_000);
        assert_eq!(config.ssrf.blocked_prefixes, vec!["192.168.", "10.", "172."]);
        assert_eq!(config.site.pages.len(), 4);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: EdgeConfig = toml::from_str(
            r#"
            [proxy]
            password = "swordfish"

            [[site.pages]]
            name = "home"
            template = "home.html"
            paths = ["/"]
            "#,
        )
        .unwrap();
        assert_eq!(config.proxy.password, "swordfish");
        assert_eq!(config.proxy.prefix, "proxy");
        assert_eq!(config.site.pages.len(), 1);
        assert!(config.site.pages[0].prefixes.is_empty());
    }

    #[test]
    fn debug_redacts_password() {
        let mut proxy = ProxyConfig::default();
        proxy.password = "swordfish".to_string();
        let rendered = format!("{:?}", proxy);
        assert!(!rendered.contains("swordfish"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn log_format_parses_lowercase() {
        let config: EdgeConfig = toml::from_str("[observability]\nlog_format = \"compact\"").unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Compact);
    }
}
