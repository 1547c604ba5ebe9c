//! Route matching logic.
//!
//! # Responsibilities
//! - Match the decoded request path exactly
//! - Match a decoded path prefix (case-sensitive)
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - An empty `AnyMatcher` never matches
//! - No regex to guarantee O(n) matching

use std::path::{Path, PathBuf};

use crate::config::PageConfig;
use crate::http::request::EdgeRequest;
use crate::security::path_guard::{PathEscape, PathGuard};

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &EdgeRequest) -> bool;
}

/// Matches one decoded path exactly.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, req: &EdgeRequest) -> bool {
        req.decoded_path() == self.path
    }
}

/// Matches the decoded path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &EdgeRequest) -> bool {
        req.decoded_path().starts_with(&self.prefix)
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, req: &EdgeRequest) -> bool {
        self.matchers.iter().any(|m| m.matches(req))
    }
}

/// A page template with its exact and prefix routes, compiled at startup.
#[derive(Debug)]
pub struct PageRoute {
    name: String,
    template: PathBuf,
    exact: AnyMatcher,
    prefix: AnyMatcher,
}

impl PageRoute {
    /// Compile a page entry; the template is resolved beneath the root.
    pub fn compile(page: &PageConfig, guard: &PathGuard) -> Result<Self, PathEscape> {
        let template = guard.resolve(&page.template)?;
        let exact = page
            .paths
            .iter()
            .map(|p| Box::new(ExactPathMatcher::new(p.as_str())) as Box<dyn Matcher>)
            .collect();
        let prefix = page
            .prefixes
            .iter()
            .map(|p| Box::new(PathPrefixMatcher::new(p.as_str())) as Box<dyn Matcher>)
            .collect();

        Ok(Self {
            name: page.name.clone(),
            template,
            exact: AnyMatcher::new(exact),
            prefix: AnyMatcher::new(prefix),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    pub fn matches_exact(&self, req: &EdgeRequest) -> bool {
        self.exact.matches(req)
    }

    pub fn matches_prefix(&self, req: &EdgeRequest) -> bool {
        self.prefix.matches(req)
    }
}

/// Whether a path segment carries a file extension (`app.js`, not `.env`).
pub fn has_extension(segment: &str) -> bool {
    Path::new(segment).extension().is_some()
}
