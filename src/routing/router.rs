//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled page routes and the proxy prefix
//! - Classify each request into exactly one `RouteDecision`
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - First match wins, rules evaluated in a fixed order:
//!   method, proxy prefix, exact page, extension, prefix page, `.html` fallback
//! - Explicit NotFound rather than silent default

use std::path::PathBuf;

use axum::http::Method;

use crate::config::{PageConfig, ProxyConfig, SiteConfig};
use crate::http::request::EdgeRequest;
use crate::routing::matcher::{has_extension, PageRoute};
use crate::security::PathGuard;

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// `OPTIONS`: answer with CORS headers and no body.
    Preflight,
    /// A file beneath the root, already resolved by the guard.
    StaticAsset(PathBuf),
    /// A page template to render.
    Page(PathBuf),
    /// Raw (still percent-encoded) path remainder after the proxy prefix.
    Proxy(String),
    NotFound,
    Forbidden,
    MethodNotAllowed,
}

impl RouteDecision {
    /// Low-cardinality label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RouteDecision::Preflight => "preflight",
            RouteDecision::StaticAsset(_) => "static",
            RouteDecision::Page(_) => "page",
            RouteDecision::Proxy(_) => "proxy",
            RouteDecision::NotFound => "not_found",
            RouteDecision::Forbidden => "forbidden",
            RouteDecision::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// Immutable request classifier.
#[derive(Debug)]
pub struct Router {
    guard: PathGuard,
    proxy_prefix: String,
    pages: Vec<PageRoute>,
}

impl Router {
    pub fn new(guard: PathGuard, proxy_prefix: impl Into<String>, pages: Vec<PageRoute>) -> Self {
        Self {
            guard,
            proxy_prefix: proxy_prefix.into(),
            pages,
        }
    }

    /// Compile page routes from configuration. Pages whose template
    /// escapes the root are skipped.
    pub fn from_config(site: &SiteConfig, proxy: &ProxyConfig, guard: PathGuard) -> Self {
        let pages = compile_pages(&site.pages, &guard);
        tracing::info!(
            root = %guard.root().display(),
            proxy_prefix = %proxy.prefix,
            pages = pages.len(),
            "Router compiled"
        );
        Self::new(guard, proxy.prefix.clone(), pages)
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Classify a request. Touches the file system only for the
    /// `<path>.html` fallback.
    pub fn classify(&self, req: &EdgeRequest) -> RouteDecision {
        match *req.method() {
            Method::GET | Method::HEAD => {}
            Method::OPTIONS => return RouteDecision::Preflight,
            _ => return RouteDecision::MethodNotAllowed,
        }

        if req.first_segment() == Some(self.proxy_prefix.as_str()) {
            return RouteDecision::Proxy(proxy_remainder(req.raw_path()).to_string());
        }

        if let Some(page) = self.pages.iter().find(|p| p.matches_exact(req)) {
            return RouteDecision::Page(page.template().to_path_buf());
        }

        let segments = req.segments();
        if segments.last().is_some_and(|s| has_extension(s)) {
            return match self.guard.resolve(&req.relative_path()) {
                Ok(path) => RouteDecision::StaticAsset(path),
                Err(e) => {
                    tracing::warn!(requested = %e.requested, "Static path rejected");
                    RouteDecision::Forbidden
                }
            };
        }

        if let Some(page) = self.pages.iter().find(|p| p.matches_prefix(req)) {
            return RouteDecision::Page(page.template().to_path_buf());
        }

        if segments.is_empty() {
            return RouteDecision::NotFound;
        }

        let candidate = format!("{}.html", req.relative_path());
        match self.guard.resolve(&candidate) {
            Ok(path) if path.is_file() => RouteDecision::Page(path),
            Ok(_) => RouteDecision::NotFound,
            Err(e) => {
                tracing::warn!(requested = %e.requested, "Page fallback rejected");
                RouteDecision::Forbidden
            }
        }
    }
}

fn compile_pages(pages: &[PageConfig], guard: &PathGuard) -> Vec<PageRoute> {
    pages
        .iter()
        .filter_map(|page| match PageRoute::compile(page, guard) {
            Ok(route) => Some(route),
            Err(e) => {
                tracing::warn!(page = %page.name, error = %e, "Skipping page route");
                None
            }
        })
        .collect()
}

/// Everything after the first path segment, e.g.
/// `/proxy/https%3A%2F%2Fa.com` → `https%3A%2F%2Fa.com`.
fn proxy_remainder(raw_path: &str) -> &str {
    raw_path
        .trim_start_matches('/')
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or("")
}
