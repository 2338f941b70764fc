//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upload call to the content store:
//!     → retry.rs (check if the failure is transient, re-attempt)
//!     → backoff.rs (jittered exponential delay between attempts)
//! ```
//!
//! # Design Decisions
//! - Retries only for transient failures; caller errors fail immediately
//! - Jittered backoff prevents thundering herd
//! - Attempt counts are bounded; exhaustion is surfaced, never swallowed

pub mod backoff;
pub mod retry;

pub use retry::{retry_with_backoff, RetryFailure, RetryPolicy};
