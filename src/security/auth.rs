//! Shared-secret authorization for proxy requests.
//!
//! The configured password is hashed once at startup (SHA-256, lowercase
//! hex). Pages receive that digest through template substitution, and
//! clients send it back as the `auth` query parameter together with an
//! optional `t` issue time in epoch milliseconds.
//!
//! When `t` is omitted the expiry check is skipped, so a leaked digest
//! without a timestamp never expires.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Query parameter carrying the digest.
pub const AUTH_PARAM: &str = "auth";
/// Query parameter carrying the issue time in epoch milliseconds.
pub const TIMESTAMP_PARAM: &str = "t";
pub const DEFAULT_MAX_AGE_MS: i64 = 600_000;

/// Why a proxy request was not authorized. Never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("proxy auth is not configured")]
    Disabled,
    #[error("auth parameter missing")]
    Missing,
    #[error("timestamp parameter is not an integer")]
    Malformed,
    #[error("digest mismatch")]
    Mismatch,
    #[error("token expired")]
    Expired,
}

/// Hex SHA-256 digest of a password.
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Current time in epoch milliseconds.
pub fn now_epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Process-wide secret digest, absent when no password is configured.
#[derive(Clone, Default)]
pub struct ProxyAuthState {
    secret_digest: Option<String>,
}

impl ProxyAuthState {
    /// Derive the state from a password; an empty password disables proxying.
    pub fn from_password(password: &str) -> Self {
        if password.is_empty() {
            Self::default()
        } else {
            Self {
                secret_digest: Some(password_digest(password)),
            }
        }
    }

    pub fn secret_digest(&self) -> Option<&str> {
        self.secret_digest.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.secret_digest.is_some()
    }

    /// Value substituted into page templates (empty when disabled).
    pub fn page_digest(&self) -> &str {
        self.secret_digest.as_deref().unwrap_or("")
    }
}

impl std::fmt::Debug for ProxyAuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyAuthState")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// The `auth`/`t` pair carried on a proxy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub hash: String,
    pub issued_at_ms: Option<i64>,
}

impl AuthToken {
    /// Extract the token from query parameters.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, AuthFailure> {
        let hash = query
            .get(AUTH_PARAM)
            .filter(|h| !h.is_empty())
            .ok_or(AuthFailure::Missing)?
            .clone();
        let issued_at_ms = match query.get(TIMESTAMP_PARAM).map(|t| t.trim()) {
            None | Some("") => None,
            Some(t) => Some(t.parse::<i64>().map_err(|_| AuthFailure::Malformed)?),
        };
        Ok(Self { hash, issued_at_ms })
    }
}

/// Verify a provided digest and optional timestamp against the secret.
///
/// The digest comparison is constant-time and otherwise equivalent to plain
/// string equality. A timestamp in the future is accepted.
pub fn verify(
    provided_hash: &str,
    provided_timestamp: Option<i64>,
    secret_digest: Option<&str>,
    now_ms: i64,
    max_age_ms: i64,
) -> Result<(), AuthFailure> {
    let secret = secret_digest.ok_or(AuthFailure::Disabled)?;

    if !constant_time_eq(provided_hash.as_bytes(), secret.as_bytes()) {
        return Err(AuthFailure::Mismatch);
    }

    if let Some(issued_at) = provided_timestamp {
        if now_ms.saturating_sub(issued_at) > max_age_ms {
            return Err(AuthFailure::Expired);
        }
    }

    Ok(())
}

/// Boolean form of [`verify`].
pub fn is_valid(
    provided_hash: &str,
    provided_timestamp: Option<i64>,
    secret_digest: Option<&str>,
    now_ms: i64,
    max_age_ms: i64,
) -> bool {
    verify(provided_hash, provided_timestamp, secret_digest, now_ms, max_age_ms).is_ok()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Authorizer bound to the process-wide state and max token age.
#[derive(Debug, Clone)]
pub struct ProxyAuthorizer {
    state: ProxyAuthState,
    max_age_ms: i64,
}

impl ProxyAuthorizer {
    pub fn new(state: ProxyAuthState, max_age_ms: i64) -> Self {
        Self { state, max_age_ms }
    }

    pub fn state(&self) -> &ProxyAuthState {
        &self.state
    }

    /// Authorize a request from its query parameters at time `now_ms`.
    pub fn authorize(&self, query: &HashMap<String, String>, now_ms: i64) -> Result<(), AuthFailure> {
        if !self.state.is_enabled() {
            return Err(AuthFailure::Disabled);
        }
        let token = AuthToken::from_query(query)?;
        verify(
            &token.hash,
            token.issued_at_ms,
            self.state.secret_digest(),
            now_ms,
            self.max_age_ms,
        )
    }
}
