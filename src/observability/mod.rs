//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http + relay produce:
//!     → logging.rs (structured log events, request ID in the trace span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
