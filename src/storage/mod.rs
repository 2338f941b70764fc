//! Content store subsystem.
//!
//! # Data Flow
//! ```text
//! bytes or JSON document
//!     → fingerprint.rs (SHA-256 over bytes / canonical JSON)
//!     → upload.rs (cache consult → bounded retry → cache record)
//!     → client.rs (HTTP POST to the content-addressed gateway)
//!     → URI
//! ```
//!
//! # Design Decisions
//! - The gateway is content-addressed: duplicate uploads are wasteful, never unsafe
//! - Zero-length input is rejected before any network call
//! - Binary and JSON uploads share identical retry and caching logic

pub mod client;
pub mod fingerprint;
pub mod upload;

pub use client::{ContentStore, HttpContentStore, StoreError};
pub use fingerprint::Fingerprint;
pub use upload::{UploadError, Uploader};
