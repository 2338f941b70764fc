//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! MintRequest (fresh single-use mint identity)
//!     → mint.rs (instruction assembly, signing, submission)
//!     → client.rs (JSON-RPC with failover and timeouts)
//!     → confirmation polling until confirmed / rejected / deadline
//! ```
//!
//! # Security Constraints
//! - Key material is never logged
//! - A mint keypair signs exactly one submission attempt
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod mint;
pub mod types;

pub use client::RpcClient;
pub use mint::{ChainClient, MintSubmitter};
pub use types::{ChainError, ConfirmationStatus, MintOutcome, MintRequest};
