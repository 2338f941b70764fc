//! Mint pipeline orchestration.
//!
//! # State machine
//! ```text
//! Init → ImageUploaded → MetadataUploaded → TransactionSubmitted → Confirmed
//! ```
//! `Failed{stage, cause}` is reachable from every non-terminal state. The
//! first two stages are idempotent (content-addressed and cached), so a
//! failed run restarts from `Init` and re-executes only the unfinished
//! suffix. Submission always uses a fresh mint identity; an identity that
//! saw one submission attempt is discarded, never resubmitted.

use futures_util::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use uuid::Uuid;

use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;

use crate::chain::mint::ChainClient;
use crate::chain::types::{ChainError, ConfirmationStatus, MintOutcome, MintRequest};
use crate::config::schema::MinterConfig;
use crate::lifecycle::shutdown::Shutdown;
use crate::metadata::{self, MetadataError, MetadataSpec};
use crate::observability::metrics;
use crate::storage::upload::{UploadError, Uploader};

/// Pipeline stage, for failure attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Image,
    Metadata,
    Submit,
    Confirm,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Image => "image",
            Stage::Metadata => "metadata",
            Stage::Submit => "submit",
            Stage::Confirm => "confirm",
        };
        f.write_str(name)
    }
}

/// Cause of a stage failure.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The run was cancelled between stages or while watching confirmation.
    #[error("run cancelled")]
    Cancelled,
}

/// Terminal failure of one pipeline run.
///
/// Carries the transaction signature when one was obtained, so the caller
/// can verify chain state independently before retrying.
#[derive(Debug, Error)]
#[error("mint run failed at {stage} stage: {cause}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub cause: StageError,
    pub signature: Option<Signature>,
}

/// One logical mint: the image payload and its descriptive fields.
#[derive(Debug, Clone)]
pub struct MintJob {
    pub image: Vec<u8>,
    pub image_mime: String,
    pub metadata: MetadataSpec,
    pub is_collection: bool,
}

/// Tunables the orchestrator reads from configuration.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub confirm_timeout: Duration,
    pub min_balance_lamports: u64,
    pub max_concurrent_runs: usize,
}

impl From<&MinterConfig> for OrchestratorSettings {
    fn from(config: &MinterConfig) -> Self {
        Self {
            confirm_timeout: Duration::from_secs(config.chain.confirm_timeout_secs),
            min_balance_lamports: config.chain.min_balance_lamports,
            max_concurrent_runs: config.pipeline.max_concurrent_runs,
        }
    }
}

/// Sequences the three pipeline stages over injected collaborators.
pub struct MintOrchestrator {
    uploader: Uploader,
    chain: Arc<dyn ChainClient>,
    authority: Arc<Keypair>,
    settings: OrchestratorSettings,
    shutdown: Arc<Shutdown>,
}

impl MintOrchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        uploader: Uploader,
        chain: Arc<dyn ChainClient>,
        authority: Arc<Keypair>,
        settings: OrchestratorSettings,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            uploader,
            chain,
            authority,
            settings,
            shutdown,
        }
    }

    /// Execute one mint run to a terminal state.
    pub async fn run(&self, job: MintJob) -> Result<MintOutcome, PipelineFailure> {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, name = %job.metadata.name, "mint run starting");

        // Init → ImageUploaded
        self.ensure_live(Stage::Image)?;
        let image_uri = self
            .uploader
            .upload_bytes(&job.image, &job.image_mime)
            .await
            .map_err(|e| self.fail(run_id, Stage::Image, e.into()))?;
        tracing::info!(%run_id, uri = %image_uri, "image stage complete");

        // ImageUploaded → MetadataUploaded
        self.ensure_live(Stage::Metadata)?;
        let document = metadata::assemble(&job.metadata, &image_uri, &job.image_mime)
            .map_err(|e| self.fail(run_id, Stage::Metadata, e.into()))?;
        let metadata_uri = self
            .uploader
            .upload_document(&document.to_document())
            .await
            .map_err(|e| self.fail(run_id, Stage::Metadata, e.into()))?;
        tracing::info!(%run_id, uri = %metadata_uri, "metadata stage complete");

        // MetadataUploaded → TransactionSubmitted
        self.ensure_live(Stage::Submit)?;
        let balance = self
            .chain
            .balance(&self.authority.pubkey())
            .await
            .map_err(|e| self.fail(run_id, Stage::Submit, e.into()))?;
        if balance < self.settings.min_balance_lamports {
            let cause = ChainError::InsufficientFunds {
                available: balance,
                required: self.settings.min_balance_lamports,
            };
            return Err(self.fail(run_id, Stage::Submit, cause.into()));
        }

        let request = MintRequest::new(
            job.metadata.name.clone(),
            job.metadata.symbol.clone(),
            metadata_uri,
            job.metadata.seller_fee_basis_points,
            job.is_collection,
            Arc::clone(&self.authority),
        )
        .map_err(|e| self.fail(run_id, Stage::Submit, e.into()))?;
        let mint_address = request.mint_address();

        let signature = self
            .chain
            .submit_mint(&request)
            .await
            .map_err(|e| self.fail(run_id, Stage::Submit, e.into()))?;
        // `request` drops here, and the mint identity with it. A retry of
        // this run builds a fresh one.

        // TransactionSubmitted → Confirmed
        if self.shutdown.is_triggered() {
            return Err(self.fail_submitted(run_id, StageError::Cancelled, signature));
        }
        let mut cancelled = self.shutdown.subscribe();
        let status = tokio::select! {
            status = self
                .chain
                .await_confirmation(&signature, self.settings.confirm_timeout) => {
                status.map_err(|e| self.fail_submitted(run_id, e.into(), signature))?
            }
            _ = cancelled.recv() => {
                return Err(self.fail_submitted(run_id, StageError::Cancelled, signature));
            }
        };

        match status {
            ConfirmationStatus::Confirmed { slot } => {
                metrics::record_mint_outcome("confirmed");
                tracing::info!(
                    %run_id,
                    signature = %signature,
                    mint = %mint_address,
                    slot,
                    "mint run confirmed"
                );
                Ok(MintOutcome {
                    signature,
                    mint_address,
                    confirmed_at_slot: Some(slot),
                })
            }
            ConfirmationStatus::Rejected(reason) => Err(self.fail_submitted(
                run_id,
                ChainError::Rejected(reason).into(),
                signature,
            )),
            ConfirmationStatus::TimedOut => Err(self.fail_submitted(
                run_id,
                ChainError::ConfirmationTimeout(self.settings.confirm_timeout.as_secs()).into(),
                signature,
            )),
        }
    }

    /// Execute independent runs concurrently, bounded by the configured cap.
    /// Results come back in input order.
    pub async fn run_many(
        &self,
        jobs: Vec<MintJob>,
    ) -> Vec<Result<MintOutcome, PipelineFailure>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_runs.max(1)));

        let runs = jobs.into_iter().map(|job| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return Err(PipelineFailure {
                            stage: Stage::Image,
                            cause: StageError::Cancelled,
                            signature: None,
                        })
                    }
                };
                self.run(job).await
            }
        });

        join_all(runs).await
    }

    fn ensure_live(&self, stage: Stage) -> Result<(), PipelineFailure> {
        if self.shutdown.is_triggered() {
            return Err(PipelineFailure {
                stage,
                cause: StageError::Cancelled,
                signature: None,
            });
        }
        Ok(())
    }

    fn fail(&self, run_id: Uuid, stage: Stage, cause: StageError) -> PipelineFailure {
        metrics::record_mint_outcome("failed");
        tracing::error!(%run_id, stage = %stage, error = %cause, "mint run failed");
        PipelineFailure {
            stage,
            cause,
            signature: None,
        }
    }

    /// Confirm-stage failure: the signature exists and must surface so the
    /// caller can check chain state before retrying.
    fn fail_submitted(
        &self,
        run_id: Uuid,
        cause: StageError,
        signature: Signature,
    ) -> PipelineFailure {
        metrics::record_mint_outcome("failed");
        tracing::error!(
            %run_id,
            stage = %Stage::Confirm,
            signature = %signature,
            error = %cause,
            "mint run failed after submission"
        );
        PipelineFailure {
            stage: Stage::Confirm,
            cause,
            signature: Some(signature),
        }
    }
}
