//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (full or compact fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span (`x-request-id`)
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed
//! - Route labels are low-cardinality (`RouteDecision::label`)

pub mod logging;
pub mod metrics;
