//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Interrupt (Ctrl-C) or caller-initiated cancellation:
//!     → shutdown.rs (trigger flag + broadcast to watchers)
//!     → pipeline checks the flag before each network call
//!     → confirmation polling races against the broadcast signal
//! ```
//!
//! # Design Decisions
//! - Cancellation is cooperative: in-flight network calls finish or time out
//! - A submitted transaction is never "undone"; cancelling only stops watching

pub mod shutdown;

pub use shutdown::Shutdown;
