//! NFT Mint Pipeline Library

pub mod cache;
pub mod chain;
pub mod config;
pub mod identity;
pub mod lifecycle;
pub mod metadata;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod storage;

pub use chain::types::MintOutcome;
pub use config::schema::MinterConfig;
pub use lifecycle::Shutdown;
pub use pipeline::orchestrator::{MintJob, MintOrchestrator, PipelineFailure};
