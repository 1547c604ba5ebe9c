//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Static/page request:
//!     → path_guard.rs (join under project root, reject escapes)
//!
//! Proxy request:
//!     → auth.rs (shared-secret digest + expiry)
//!     → ssrf.rs (scheme allow-list, host/prefix block-lists)
//!     → [upstream fetch]
//!     → headers.rs (strip block-listed and hop-by-hop headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Every check is a pure function over immutable, startup-built policy
//! - No trust in client input

pub mod auth;
pub mod headers;
pub mod path_guard;
pub mod ssrf;

pub use auth::{ProxyAuthState, ProxyAuthorizer};
pub use headers::ResponseSanitizer;
pub use path_guard::PathGuard;
pub use ssrf::SsrfPolicy;
