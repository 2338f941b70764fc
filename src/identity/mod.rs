//! Signing identity resolution.
//!
//! # Security
//! - Secrets are read only from a keypair file or an environment variable
//! - Key material is never logged or serialized
//!
//! The file format is the standard CLI wallet format: a JSON array of the
//! 64 keypair bytes. The environment variable holds the same bytes encoded
//! as base58.

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::IdentityConfig;

/// Errors that can occur while resolving the signing identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Neither a keypair file nor the environment variable is available.
    #[error("no signing identity: set identity.keypair_path or the {0} environment variable")]
    Missing(String),

    /// The keypair file could not be read or parsed.
    #[error("keypair file {path}: {reason}")]
    File { path: String, reason: String },

    /// The secret bytes do not form a valid keypair.
    #[error("malformed keypair secret: {0}")]
    Malformed(String),
}

/// Resolve the signing keypair from the configured secret source.
///
/// A configured file path takes precedence over the environment variable.
pub fn resolve_signer(config: &IdentityConfig) -> Result<Keypair, IdentityError> {
    let keypair = match &config.keypair_path {
        Some(path) => from_file(Path::new(path))?,
        None => match std::env::var(&config.keypair_env) {
            Ok(secret) => from_base58(secret.trim())?,
            Err(_) => return Err(IdentityError::Missing(config.keypair_env.clone())),
        },
    };

    tracing::info!(address = %keypair.pubkey(), "signing identity resolved");
    Ok(keypair)
}

/// Load a keypair from a JSON keypair file.
pub fn from_file(path: &Path) -> Result<Keypair, IdentityError> {
    let file_error = |reason: String| IdentityError::File {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let bytes: Vec<u8> = serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))?;
    keypair_from_bytes(&bytes)
}

/// Load a keypair from a base58-encoded secret.
pub fn from_base58(secret: &str) -> Result<Keypair, IdentityError> {
    let bytes = bs58::decode(secret)
        .into_vec()
        .map_err(|e| IdentityError::Malformed(e.to_string()))?;
    keypair_from_bytes(&bytes)
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair, IdentityError> {
    Keypair::from_bytes(bytes).map_err(|e| IdentityError::Malformed(e.to_string()))
}
