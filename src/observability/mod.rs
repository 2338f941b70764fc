//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, run-scoped correlation IDs)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber (EnvFilter controlled)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap (atomic increments); no exporter is embedded
//! - Key material and payload bytes are never logged

pub mod metrics;
