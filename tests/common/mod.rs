//! Shared test doubles for the pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

use nft_minter::cache::ArtifactCache;
use nft_minter::chain::mint::ChainClient;
use nft_minter::chain::types::{ChainError, ChainResult, ConfirmationStatus, MintRequest};
use nft_minter::lifecycle::Shutdown;
use nft_minter::metadata::MetadataSpec;
use nft_minter::pipeline::orchestrator::{MintJob, MintOrchestrator, OrchestratorSettings};
use nft_minter::resilience::retry::RetryPolicy;
use nft_minter::storage::client::{ContentStore, StoreError};
use nft_minter::storage::fingerprint::Fingerprint;
use nft_minter::storage::upload::Uploader;

/// A 10-byte PNG header stub, small enough to inline in assertions.
pub const PNG_STUB: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01];

/// Content store double: fails the first `fail_first` calls with a network
/// error, then answers with a content-derived URI.
pub struct ScriptedStore {
    calls: AtomicU32,
    fail_first: u32,
}

impl ScriptedStore {
    pub fn new(fail_first: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            fail_first,
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for ScriptedStore {
    async fn upload(&self, bytes: &[u8], _mime: &str) -> Result<String, StoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first {
            return Err(StoreError::Network("connection reset".to_string()));
        }
        Ok(format!("mock://{}", Fingerprint::of_bytes(bytes)))
    }
}

/// Chain double with programmable balance, submission behavior, and
/// confirmation answer. Records every mint identity it sees.
pub struct MockChain {
    pub balance_lamports: u64,
    pub fail_submit: bool,
    pub confirmation: ConfirmationStatus,
    pub confirm_delay: Duration,
    pub submissions: AtomicU32,
    pub minted: Mutex<Vec<Pubkey>>,
    pub signatures: Mutex<Vec<Signature>>,
}

impl MockChain {
    pub fn with(
        balance_lamports: u64,
        fail_submit: bool,
        confirmation: ConfirmationStatus,
    ) -> Arc<Self> {
        Arc::new(Self {
            balance_lamports,
            fail_submit,
            confirmation,
            confirm_delay: Duration::from_millis(0),
            submissions: AtomicU32::new(0),
            minted: Mutex::new(Vec::new()),
            signatures: Mutex::new(Vec::new()),
        })
    }

    /// A funded chain that confirms at the given slot.
    pub fn confirming(slot: u64) -> Arc<Self> {
        Self::with(1_000_000_000, false, ConfirmationStatus::Confirmed { slot })
    }

    pub fn submissions(&self) -> u32 {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn minted(&self) -> Vec<Pubkey> {
        self.minted.lock().unwrap().clone()
    }

    pub fn signatures(&self) -> Vec<Signature> {
        self.signatures.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn balance(&self, _account: &Pubkey) -> ChainResult<u64> {
        Ok(self.balance_lamports)
    }

    async fn submit_mint(&self, request: &MintRequest) -> ChainResult<Signature> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.minted.lock().unwrap().push(request.mint_address());

        if self.fail_submit {
            return Err(ChainError::Rpc("node unavailable".to_string()));
        }

        let signature = Signature::new_unique();
        self.signatures.lock().unwrap().push(signature);
        Ok(signature)
    }

    async fn await_confirmation(
        &self,
        _signature: &Signature,
        _deadline: Duration,
    ) -> ChainResult<ConfirmationStatus> {
        if !self.confirm_delay.is_zero() {
            tokio::time::sleep(self.confirm_delay).await;
        }
        Ok(self.confirmation.clone())
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        confirm_timeout: Duration::from_secs(1),
        min_balance_lamports: 10_000_000,
        max_concurrent_runs: 2,
    }
}

/// Orchestrator over the given doubles with a private cache.
pub fn orchestrator(
    store: Arc<ScriptedStore>,
    chain: Arc<MockChain>,
    shutdown: Arc<Shutdown>,
) -> MintOrchestrator {
    orchestrator_with_cache(store, chain, ArtifactCache::new(None), shutdown)
}

/// Orchestrator over the given doubles, sharing the caller's cache.
pub fn orchestrator_with_cache(
    store: Arc<ScriptedStore>,
    chain: Arc<MockChain>,
    cache: ArtifactCache,
    shutdown: Arc<Shutdown>,
) -> MintOrchestrator {
    let uploader = Uploader::new(store, cache, fast_policy());
    MintOrchestrator::new(
        uploader,
        chain,
        Arc::new(Keypair::new()),
        settings(),
        shutdown,
    )
}

/// A well-formed job for the given name and image bytes.
pub fn job(name: &str, image: &[u8]) -> MintJob {
    MintJob {
        image: image.to_vec(),
        image_mime: "image/png".to_string(),
        metadata: MetadataSpec {
            name: name.to_string(),
            symbol: "TEST".to_string(),
            description: "integration test token".to_string(),
            seller_fee_basis_points: 500,
            attributes: Vec::new(),
            image_uri: None,
            image_mime: None,
        },
        is_collection: false,
    }
}
