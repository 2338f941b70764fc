//! End-to-end pipeline tests over programmable collaborators.

use std::sync::Arc;

use nft_minter::cache::ArtifactCache;
use nft_minter::chain::types::ChainError;
use nft_minter::lifecycle::Shutdown;
use nft_minter::pipeline::orchestrator::{Stage, StageError};

mod common;
use common::{job, orchestrator, orchestrator_with_cache, MockChain, ScriptedStore, PNG_STUB};

#[tokio::test]
async fn test_happy_path_confirms_and_reports_outcome() {
    let store = ScriptedStore::new(0);
    let chain = MockChain::confirming(42);
    let orchestrator = orchestrator(
        Arc::clone(&store),
        Arc::clone(&chain),
        Arc::new(Shutdown::new()),
    );

    let outcome = orchestrator.run(job("Gradient #1", PNG_STUB)).await.unwrap();

    // One image upload, one metadata upload.
    assert_eq!(store.calls(), 2);
    assert_eq!(chain.submissions(), 1);
    assert_eq!(outcome.signature, chain.signatures()[0]);
    assert_eq!(outcome.mint_address, chain.minted()[0]);
    assert_eq!(outcome.confirmed_at_slot, Some(42));
}

#[tokio::test]
async fn test_invalid_metadata_stops_before_metadata_upload() {
    let store = ScriptedStore::new(0);
    let chain = MockChain::confirming(1);
    let orchestrator = orchestrator(
        Arc::clone(&store),
        Arc::clone(&chain),
        Arc::new(Shutdown::new()),
    );

    let mut bad = job("", PNG_STUB);
    bad.metadata.name = String::new();

    let failure = orchestrator.run(bad).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Metadata);
    assert!(matches!(failure.cause, StageError::Metadata(_)));
    // The image stage ran; the metadata document was never uploaded.
    assert_eq!(store.calls(), 1);
    assert_eq!(chain.submissions(), 0);
}

#[tokio::test]
async fn test_basis_points_out_of_range_fails_before_any_chain_call() {
    let store = ScriptedStore::new(0);
    let chain = MockChain::confirming(1);
    let orchestrator = orchestrator(
        Arc::clone(&store),
        Arc::clone(&chain),
        Arc::new(Shutdown::new()),
    );

    let mut bad = job("Gradient #1", PNG_STUB);
    bad.metadata.seller_fee_basis_points = 10_001;

    let failure = orchestrator.run(bad).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Metadata);
    assert_eq!(chain.submissions(), 0);
}

#[tokio::test]
async fn test_restarted_run_reuses_cached_uploads() {
    let store = ScriptedStore::new(0);
    let cache = ArtifactCache::new(None);
    let shutdown = Arc::new(Shutdown::new());

    // First run submits but never sees a confirmation.
    let stalled = MockChain::with(
        1_000_000_000,
        false,
        nft_minter::chain::types::ConfirmationStatus::TimedOut,
    );
    let first = orchestrator_with_cache(
        Arc::clone(&store),
        Arc::clone(&stalled),
        cache.clone(),
        Arc::clone(&shutdown),
    );
    let failure = first.run(job("Gradient #1", PNG_STUB)).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Confirm);
    assert_eq!(store.calls(), 2);

    // The restart re-executes only the unfinished suffix: both uploads come
    // from the cache, and submission uses a fresh mint identity.
    let healthy = MockChain::confirming(7);
    let second = orchestrator_with_cache(
        Arc::clone(&store),
        Arc::clone(&healthy),
        cache.clone(),
        shutdown,
    );
    let outcome = second.run(job("Gradient #1", PNG_STUB)).await.unwrap();

    assert_eq!(store.calls(), 2);
    assert_eq!(outcome.confirmed_at_slot, Some(7));
    assert_ne!(healthy.minted()[0], stalled.minted()[0]);
}

#[tokio::test]
async fn test_run_many_completes_all_jobs_in_order() {
    let store = ScriptedStore::new(0);
    let chain = MockChain::confirming(3);
    let orchestrator = orchestrator(
        Arc::clone(&store),
        Arc::clone(&chain),
        Arc::new(Shutdown::new()),
    );

    let jobs = vec![
        job("Gradient #1", b"image one"),
        job("Gradient #2", b"image two"),
        job("Gradient #3", b"image three"),
    ];
    let results = orchestrator.run_many(jobs).await;

    assert_eq!(results.len(), 3);
    let outcomes: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();
    // Each job uploads its own image and metadata document.
    assert_eq!(store.calls(), 6);
    assert_eq!(chain.submissions(), 3);
    // Every run minted a distinct token identity.
    let minted = chain.minted();
    assert_ne!(minted[0], minted[1]);
    assert_ne!(minted[1], minted[2]);
    assert_eq!(outcomes.len(), 3);
}

#[tokio::test]
async fn test_insufficient_funds_blocks_submission() {
    let store = ScriptedStore::new(0);
    let chain = MockChain::with(
        5_000,
        false,
        nft_minter::chain::types::ConfirmationStatus::Confirmed { slot: 1 },
    );
    let orchestrator = orchestrator(
        Arc::clone(&store),
        Arc::clone(&chain),
        Arc::new(Shutdown::new()),
    );

    let failure = orchestrator.run(job("Gradient #1", PNG_STUB)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Submit);
    assert!(matches!(
        failure.cause,
        StageError::Chain(ChainError::InsufficientFunds { available: 5_000, .. })
    ));
    // Failed pre-flight; nothing was submitted.
    assert_eq!(chain.submissions(), 0);
}
