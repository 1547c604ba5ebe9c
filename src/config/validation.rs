//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and shapes the
//! rest of the system relies on. All problems are collected, not just the
//! first one.

use std::net::SocketAddr;
use std::path::{Component, Path};

use axum::http::HeaderValue;

use crate::config::schema::EdgeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.site.root.as_os_str().is_empty() {
        errors.push(ValidationError::new("site.root", "must not be empty"));
    }
    for (field, value) in [
        ("site.static_cache_control", &config.site.static_cache_control),
        ("site.page_cache_control", &config.site.page_cache_control),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(field, "not a valid header value"));
        }
    }
    for (i, page) in config.site.pages.iter().enumerate() {
        let field = format!("site.pages[{}]", i);
        if !is_plain_relative(Path::new(&page.template)) {
            errors.push(ValidationError::new(
                format!("{}.template", field),
                "must be a relative path without '..'",
            ));
        }
        if page.paths.is_empty() && page.prefixes.is_empty() {
            errors.push(ValidationError::new(field.clone(), "needs at least one path or prefix"));
        }
        for path in page.paths.iter().chain(page.prefixes.iter()) {
            if !path.starts_with('/') {
                errors.push(ValidationError::new(
                    field.clone(),
                    format!("route '{}' must start with '/'", path),
                ));
            }
        }
    }

    if config.proxy.prefix.is_empty() || config.proxy.prefix.contains('/') {
        errors.push(ValidationError::new("proxy.prefix", "must be a single non-empty path segment"));
    }
    if config.proxy.timeout_ms == 0 {
        errors.push(ValidationError::new("proxy.timeout_ms", "must be greater than 0"));
    }
    if config.proxy.auth_max_age_ms <= 0 {
        errors.push(ValidationError::new("proxy.auth_max_age_ms", "must be greater than 0"));
    }
    if HeaderValue::from_str(&config.proxy.user_agent).is_err() {
        errors.push(ValidationError::new("proxy.user_agent", "not a valid header value"));
    }

    if config.ssrf.allowed_schemes.is_empty() {
        errors.push(ValidationError::new("ssrf.allowed_schemes", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_plain_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PageConfig;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&EdgeConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = EdgeConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.proxy.prefix = "a/b".to_string();
        config.proxy.timeout_ms = 0;
        config.ssrf.allowed_schemes.clear();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"proxy.prefix"));
        assert!(fields.contains(&"proxy.timeout_ms"));
        assert!(fields.contains(&"ssrf.allowed_schemes"));
    }

    #[test]
    fn rejects_escaping_page_template() {
        let mut config = EdgeConfig::default();
        config.site.pages.push(PageConfig {
            name: "evil".to_string(),
            template: "../outside.html".to_string(),
            paths: vec!["/evil".to_string()],
            prefixes: vec![],
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "site.pages[4].template");
    }

    #[test]
    fn rejects_route_without_leading_slash() {
        let mut config = EdgeConfig::default();
        config.site.pages[0].paths.push("index".to_string());
        assert!(validate_config(&config).is_err());
    }
}
