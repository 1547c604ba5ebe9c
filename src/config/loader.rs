//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::EdgeConfig;
use crate::config::validation::ValidationError;

/// Shared secret for proxy auth and page substitution.
pub const ENV_PASSWORD: &str = "PASSWORD";
/// Comma-separated exact hostnames blocked for proxying.
pub const ENV_BLOCKED_HOSTS: &str = "BLOCKED_HOSTS";
/// Comma-separated hostname prefixes blocked for proxying.
pub const ENV_BLOCKED_IP_PREFIXES: &str = "BLOCKED_IP_PREFIXES";
/// Comma-separated response headers stripped from proxied responses.
pub const ENV_FILTERED_HEADERS: &str = "FILTERED_HEADERS";
pub const ENV_PROJECT_ROOT: &str = "PROJECT_ROOT";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<EdgeConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Load the file (or defaults when no path is given) and apply the process
/// environment on top. The result is not yet validated.
pub fn load(path: Option<&Path>) -> Result<EdgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// `PASSWORD` applies whenever it is set, even to an empty value. The list
/// variables and paths only apply when non-empty, so an empty
/// `BLOCKED_HOSTS=` keeps the configured (or default) list.
pub fn apply_env_overrides<F>(config: &mut EdgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(password) = lookup(ENV_PASSWORD) {
        config.proxy.password = password;
    }

    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(hosts) = non_empty(ENV_BLOCKED_HOSTS) {
        config.ssrf.blocked_hosts = split_list(&hosts);
    }
    if let Some(prefixes) = non_empty(ENV_BLOCKED_IP_PREFIXES) {
        config.ssrf.blocked_prefixes = split_list(&prefixes);
    }
    if let Some(headers) = non_empty(ENV_FILTERED_HEADERS) {
        config.sanitizer.filtered_headers = split_list(&headers);
    }
    if let Some(root) = non_empty(ENV_PROJECT_ROOT) {
        config.site.root = PathBuf::from(root);
    }
    if let Some(bind) = non_empty(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind.trim().to_string();
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
