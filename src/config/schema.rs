//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the minter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the mint pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MinterConfig {
    /// Signing identity resolution (keypair file or environment variable).
    pub identity: IdentityConfig,

    /// Content store gateway settings.
    pub storage: StorageConfig,

    /// Blockchain RPC and confirmation settings.
    pub chain: ChainConfig,

    /// Upload retry settings.
    pub retry: RetryConfig,

    /// Artifact cache persistence.
    pub cache: CacheConfig,

    /// Pipeline execution settings.
    pub pipeline: PipelineConfig,
}

/// Signing identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to a JSON keypair file (64-byte array, CLI wallet format).
    pub keypair_path: Option<String>,

    /// Environment variable holding a base58-encoded keypair.
    /// Consulted when `keypair_path` is unset.
    pub keypair_env: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            keypair_path: None,
            keypair_env: "MINTER_KEYPAIR".to_string(),
        }
    }
}

/// Content store gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Upload endpoint of the content-addressed gateway.
    pub endpoint: String,

    /// Optional bearer token for the gateway.
    pub api_token: Option<String>,

    /// Per-upload request timeout in seconds.
    pub request_timeout_secs: u64,

    /// URI scheme used when the gateway answers with a bare content ID.
    pub uri_scheme: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/upload".to_string(),
            api_token: None,
            request_timeout_secs: 30,
            uri_scheme: "ipfs".to_string(),
        }
    }
}

/// Blockchain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Primary JSON-RPC endpoint.
    pub rpc_url: String,

    /// Ordered failover endpoints tried when the primary fails.
    pub failover_urls: Vec<String>,

    /// Per-request RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Commitment level a transaction must reach to count as confirmed
    /// ("processed", "confirmed", or "finalized").
    pub commitment: String,

    /// Maximum time to wait for confirmation, in seconds.
    pub confirm_timeout_secs: u64,

    /// Interval between confirmation polls, in milliseconds.
    pub confirm_poll_interval_ms: u64,

    /// Minimum authority balance required before submitting, in lamports.
    pub min_balance_lamports: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            // Local test validator default
            rpc_url: "http://localhost:8899".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            commitment: "confirmed".to_string(),
            confirm_timeout_secs: 60,
            confirm_poll_interval_ms: 2_000,
            min_balance_lamports: 10_000_000,
        }
    }
}

/// Upload retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total upload attempts, including the first.
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Artifact cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Path of the JSON file the cache persists to. Unset disables persistence.
    pub persistence_path: Option<String>,
}

/// Pipeline execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of mint runs executing concurrently.
    pub max_concurrent_runs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 4,
        }
    }
}
