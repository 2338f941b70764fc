//! Mint pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! image bytes
//!     → storage (upload, cached by fingerprint)   → image URI
//!     → metadata (assemble + upload)              → metadata URI
//!     → chain (fresh mint identity, submit)       → signature
//!     → chain (confirmation polling)              → MintOutcome
//! ```
//!
//! # Design Decisions
//! - Collaborators are injected, never ambient singletons
//! - Stages fail closed; the failing stage and cause surface verbatim
//! - Restarting a failed run reuses cached uploads and re-executes only the
//!   unfinished suffix, with a new mint identity

pub mod orchestrator;

pub use orchestrator::{
    MintJob, MintOrchestrator, OrchestratorSettings, PipelineFailure, Stage, StageError,
};
