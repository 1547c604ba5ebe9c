//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered rules)
//!     → matcher.rs (evaluate page path conditions)
//!     → Return: RouteDecision
//!
//! Route Compilation (at startup):
//!     PageConfig[]
//!     → Resolve templates beneath the root
//!     → Compile exact / prefix matchers
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (exact and prefix matching only)
//! - Deterministic: same input always yields the same decision
//! - First match wins

pub mod matcher;
pub mod router;

pub use router::{RouteDecision, Router};
