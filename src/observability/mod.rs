//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → counter.rs (successful conversions, served on GET /count)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → /count
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines via the trace span
//! - Metrics and the request counter are atomic increments
//! - The request counter is injected, never global

pub mod counter;
pub mod logging;
pub mod metrics;

pub use counter::RequestCounter;
