//! Outbound HTTP client for proxy fetches.
//!
//! # Responsibilities
//! - Send a single GET with a fixed User-Agent
//! - Bound the time to response headers
//! - Follow redirects only to targets the SSRF policy allows
//!
//! # Design Decisions
//! - No retries: one attempt per request
//! - System proxies are ignored so targets are reached directly
//! - The body is not read here; it is streamed by `relay`

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;
use crate::security::ssrf::{check_url, SsrfPolicy, SsrfVerdict};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("no response headers within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// HTTP client shared by every proxy request.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig, policy: Arc<SsrfPolicy>) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(timeout)
            .redirect(redirect_policy(config.max_redirects, policy))
            .no_proxy()
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Send the request and wait for response headers.
    pub async fn fetch(&self, url: Url) -> Result<reqwest::Response, UpstreamError> {
        match tokio::time::timeout(self.timeout, self.client.get(url).send()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }
}

fn redirect_policy(max_redirects: usize, policy: Arc<SsrfPolicy>) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error("too many redirects");
        }
        match check_url(attempt.url(), &policy) {
            SsrfVerdict::Allow => attempt.follow(),
            SsrfVerdict::Block(reason) => {
                tracing::warn!(
                    target_host = attempt.url().host_str().unwrap_or(""),
                    reason = reason.as_str(),
                    "Redirect to blocked target refused"
                );
                attempt.error(format!("redirect blocked: {}", reason.as_str()))
            }
        }
    })
}
