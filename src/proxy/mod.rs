//! Forward proxy subsystem.
//!
//! # Data Flow
//! ```text
//! RouteDecision::Proxy(encoded)
//!     → empty target?            → 400
//!     → ProxyAuthorizer (auth,t)  → 401
//!     → percent-decode + SSRF     → 400
//!     → client.rs (GET, bounded wait for headers) → 502
//!     → relay.rs (status, sanitized headers, streamed body)
//! ```
//!
//! # Design Decisions
//! - Authorization runs before the target is even decoded
//! - Rejection reasons are logged; callers see one generic message per status

pub mod client;
pub mod relay;

use std::sync::Arc;

use axum::response::Response;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::EdgeConfig;
use crate::error::EdgeError;
use crate::http::request::EdgeRequest;
use crate::observability::metrics;
use crate::security::auth::{now_epoch_millis, ProxyAuthState, ProxyAuthorizer};
use crate::security::ssrf::{check_url, BlockReason, SsrfPolicy, SsrfVerdict};
use crate::security::ResponseSanitizer;

pub use client::{UpstreamClient, UpstreamError};

/// Everything a proxy request needs, built once at startup.
#[derive(Debug)]
pub struct ProxyService {
    authorizer: ProxyAuthorizer,
    policy: Arc<SsrfPolicy>,
    sanitizer: ResponseSanitizer,
    client: UpstreamClient,
}

impl ProxyService {
    pub fn new(
        authorizer: ProxyAuthorizer,
        policy: Arc<SsrfPolicy>,
        sanitizer: ResponseSanitizer,
        client: UpstreamClient,
    ) -> Self {
        Self {
            authorizer,
            policy,
            sanitizer,
            client,
        }
    }

    pub fn from_config(config: &EdgeConfig) -> Result<Self, reqwest::Error> {
        let state = ProxyAuthState::from_password(&config.proxy.password);
        if !state.is_enabled() {
            tracing::warn!("No proxy password configured, all proxy requests will be refused");
        }
        let authorizer = ProxyAuthorizer::new(state, config.proxy.auth_max_age_ms);
        let policy = Arc::new(SsrfPolicy::from_config(&config.ssrf));
        let sanitizer = ResponseSanitizer::new(&config.sanitizer.filtered_headers);
        let client = UpstreamClient::new(&config.proxy, policy.clone())?;
        Ok(Self::new(authorizer, policy, sanitizer, client))
    }

    pub fn auth_state(&self) -> &ProxyAuthState {
        self.authorizer.state()
    }

    /// Authorize, validate and fetch `encoded`, then relay the upstream response.
    pub async fn forward(&self, req: &EdgeRequest, encoded: &str) -> Result<Response, EdgeError> {
        if encoded.is_empty() {
            tracing::debug!("Proxy request without target");
            return Err(EdgeError::InvalidTarget);
        }

        if let Err(failure) = self.authorizer.authorize(req.query(), now_epoch_millis()) {
            tracing::warn!(reason = %failure, "Proxy request unauthorized");
            return Err(EdgeError::Unauthorized);
        }

        let target = percent_decode_str(encoded).decode_utf8().map_err(|_| {
            self.blocked(BlockReason::Unparsable, encoded);
            EdgeError::InvalidTarget
        })?;

        let url = match Url::parse(&target) {
            Ok(url) => url,
            Err(_) => {
                self.blocked(BlockReason::Unparsable, &target);
                return Err(EdgeError::InvalidTarget);
            }
        };
        if let SsrfVerdict::Block(reason) = check_url(&url, &self.policy) {
            self.blocked(reason, &target);
            return Err(EdgeError::InvalidTarget);
        }

        tracing::debug!(target_url = %url, "Forwarding proxy request");
        let upstream = self.client.fetch(url).await.map_err(|e| {
            tracing::warn!(target_url = %target, error = %e, "Upstream request failed");
            EdgeError::UpstreamFailure
        })?;

        tracing::debug!(target_url = %target, status = %upstream.status(), "Upstream responded");
        Ok(relay::relay(upstream, &self.sanitizer))
    }

    fn blocked(&self, reason: BlockReason, target: &str) {
        tracing::warn!(target_url = %target, reason = reason.as_str(), "Proxy target blocked");
        metrics::record_proxy_blocked(reason.as_str());
    }
}
