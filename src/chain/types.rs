//! Chain-side types and error definitions.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use std::sync::Arc;
use thiserror::Error;

use crate::metadata::MAX_SELLER_FEE_BASIS_POINTS;

/// On-chain limit for the token name.
pub const MAX_NAME_LEN: usize = 32;
/// On-chain limit for the token symbol.
pub const MAX_SYMBOL_LEN: usize = 10;
/// On-chain limit for the metadata URI.
pub const MAX_URI_LEN: usize = 200;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out on every endpoint.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Authority balance below the configured minimum.
    #[error("insufficient funds: {available} lamports available, {required} required")]
    InsufficientFunds { available: u64, required: u64 },

    /// The transaction was rejected by the node or on-chain.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Confirmation did not arrive within the deadline.
    #[error("confirmation timed out after {0} seconds")]
    ConfirmationTimeout(u64),

    /// Request construction failed before any network call.
    #[error("invalid mint request: {0}")]
    InvalidRequest(String),

    /// Wire serialization failed.
    #[error("transaction encoding failed: {0}")]
    Encoding(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Terminal state of a confirmation wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Reached the target commitment level.
    Confirmed { slot: u64 },
    /// Landed with an on-chain error.
    Rejected(String),
    /// No definitive answer within the deadline; the transaction may still land.
    TimedOut,
}

/// A single mint attempt: the on-chain fields plus a fresh single-use mint
/// identity. The mint keypair's public key becomes the permanent token
/// identity, so a request must never be submitted twice.
pub struct MintRequest {
    pub name: String,
    pub symbol: String,
    pub metadata_uri: String,
    pub seller_fee_basis_points: u16,
    pub is_collection: bool,
    mint: Keypair,
    pub authority: Arc<Keypair>,
}

impl MintRequest {
    /// Validate the fields and generate a fresh mint identity.
    pub fn new(
        name: String,
        symbol: String,
        metadata_uri: String,
        seller_fee_basis_points: u16,
        is_collection: bool,
        authority: Arc<Keypair>,
    ) -> ChainResult<Self> {
        if name.trim().is_empty() {
            return Err(ChainError::InvalidRequest("name must not be empty".to_string()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ChainError::InvalidRequest(format!(
                "name exceeds {MAX_NAME_LEN} bytes"
            )));
        }
        if symbol.len() > MAX_SYMBOL_LEN {
            return Err(ChainError::InvalidRequest(format!(
                "symbol exceeds {MAX_SYMBOL_LEN} bytes"
            )));
        }
        if metadata_uri.is_empty() {
            return Err(ChainError::InvalidRequest(
                "metadata URI must not be empty".to_string(),
            ));
        }
        if metadata_uri.len() > MAX_URI_LEN {
            return Err(ChainError::InvalidRequest(format!(
                "metadata URI exceeds {MAX_URI_LEN} bytes"
            )));
        }
        if seller_fee_basis_points > MAX_SELLER_FEE_BASIS_POINTS {
            return Err(ChainError::InvalidRequest(format!(
                "seller_fee_basis_points {seller_fee_basis_points} exceeds {MAX_SELLER_FEE_BASIS_POINTS}"
            )));
        }

        Ok(Self {
            name,
            symbol,
            metadata_uri,
            seller_fee_basis_points,
            is_collection,
            mint: Keypair::new(),
            authority,
        })
    }

    /// The token identity this request would create.
    pub fn mint_address(&self) -> Pubkey {
        self.mint.pubkey()
    }

    /// The single-use mint keypair, for transaction signing.
    pub fn mint_keypair(&self) -> &Keypair {
        &self.mint
    }
}

impl std::fmt::Debug for MintRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintRequest")
            .field("name", &self.name)
            .field("metadata_uri", &self.metadata_uri)
            .field("seller_fee_basis_points", &self.seller_fee_basis_points)
            .field("is_collection", &self.is_collection)
            .field("mint_address", &self.mint_address())
            .finish()
    }
}

/// The result of a confirmed mint. Terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOutcome {
    pub signature: Signature,
    pub mint_address: Pubkey,
    pub confirmed_at_slot: Option<u64>,
}
