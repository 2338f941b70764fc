//! NFT Mint Pipeline (v1)
//!
//! A three-stage mint pipeline built with Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!   image bytes        ┌─────────┐   image URI   ┌──────────┐  metadata URI  ┌─────────┐
//!   ─────────────────▶ │ storage │ ────────────▶ │ metadata │ ─────────────▶ │  chain  │
//!                      │ upload  │               │ assemble │                │ submit+ │
//!                      └────┬────┘               │ + upload │                │ confirm │
//!                           │                    └────┬─────┘                └────┬────┘
//!                           ▼                         ▼                          ▼
//!                    artifact cache            artifact cache           signature + mint
//!                  (fingerprint → URI)       (fingerprint → URI)            address
//!
//!   Cross-cutting: config (TOML), identity (keypair), resilience (retry),
//!   lifecycle (cancellation), observability (tracing + metrics)
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solana_sdk::signer::Signer;

use nft_minter::cache::ArtifactCache;
use nft_minter::chain::mint::{ChainClient, MintSubmitter};
use nft_minter::chain::types::{ChainError, ConfirmationStatus, MintRequest};
use nft_minter::config::loader::load_config;
use nft_minter::config::schema::MinterConfig;
use nft_minter::identity;
use nft_minter::lifecycle::Shutdown;
use nft_minter::metadata::{self, MetadataSpec};
use nft_minter::pipeline::orchestrator::{MintJob, MintOrchestrator, OrchestratorSettings};
use nft_minter::resilience::retry::RetryPolicy;
use nft_minter::storage::client::HttpContentStore;
use nft_minter::storage::upload::Uploader;

#[derive(Parser)]
#[command(name = "nft-minter")]
#[command(about = "Upload content, upload metadata, and mint an NFT", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "minter.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image to the content store and print its URI
    UploadImage {
        path: PathBuf,
        /// MIME type override; inferred from the extension otherwise
        #[arg(long)]
        mime: Option<String>,
    },
    /// Assemble a metadata document from a JSON spec, upload it, print its URI
    UploadMetadata {
        spec: PathBuf,
        /// Image URI; overrides the spec's image_uri field
        #[arg(long)]
        image_uri: Option<String>,
        /// Image MIME type; overrides the spec's image_mime field
        #[arg(long)]
        image_mime: Option<String>,
    },
    /// Submit a mint transaction for an uploaded metadata document
    Mint {
        metadata_uri: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        symbol: String,
        #[arg(long, default_value_t = 0)]
        seller_fee_basis_points: u16,
        /// Mark the minted token as a collection parent
        #[arg(long)]
        collection: bool,
    },
    /// Run the full pipeline: image upload, metadata upload, mint
    Run {
        image: PathBuf,
        spec: PathBuf,
        /// MIME type override for the image
        #[arg(long)]
        mime: Option<String>,
        /// Mark the minted token as a collection parent
        #[arg(long)]
        collection: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nft_minter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        match load_config(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %cli.config.display(), error = %e, "failed to load configuration");
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
        MinterConfig::default()
    };

    match run_command(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_command(
    command: Commands,
    config: &MinterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::UploadImage { path, mime } => {
            let uploader = build_uploader(config)?;
            let bytes = std::fs::read(&path)?;
            let mime = mime.unwrap_or_else(|| mime_for_path(&path).to_string());

            let uri = uploader.upload_bytes(&bytes, &mime).await?;
            println!("{uri}");
            Ok(())
        }

        Commands::UploadMetadata {
            spec,
            image_uri,
            image_mime,
        } => {
            let uploader = build_uploader(config)?;
            let spec: MetadataSpec = serde_json::from_str(&std::fs::read_to_string(&spec)?)?;

            let image_uri = image_uri
                .or_else(|| spec.image_uri.clone())
                .ok_or("metadata spec needs an image URI (image_uri field or --image-uri)")?;
            let image_mime = image_mime
                .or_else(|| spec.image_mime.clone())
                .unwrap_or_else(|| "image/png".to_string());

            let document = metadata::assemble(&spec, &image_uri, &image_mime)?;
            let uri = uploader.upload_document(&document.to_document()).await?;
            println!("{uri}");
            Ok(())
        }

        Commands::Mint {
            metadata_uri,
            name,
            symbol,
            seller_fee_basis_points,
            collection,
        } => {
            let authority = Arc::new(identity::resolve_signer(&config.identity)?);
            let chain = MintSubmitter::new(&config.chain)?;

            let balance = chain.balance(&authority.pubkey()).await?;
            if balance < config.chain.min_balance_lamports {
                return Err(ChainError::InsufficientFunds {
                    available: balance,
                    required: config.chain.min_balance_lamports,
                }
                .into());
            }

            let request = MintRequest::new(
                name,
                symbol,
                metadata_uri,
                seller_fee_basis_points,
                collection,
                authority,
            )?;
            let mint_address = request.mint_address();
            let signature = chain.submit_mint(&request).await?;

            let deadline = Duration::from_secs(config.chain.confirm_timeout_secs);
            match chain.await_confirmation(&signature, deadline).await? {
                ConfirmationStatus::Confirmed { .. } => {
                    println!("signature: {signature}");
                    println!("mint: {mint_address}");
                    Ok(())
                }
                ConfirmationStatus::Rejected(reason) => {
                    Err(format!("transaction {signature} rejected: {reason}").into())
                }
                ConfirmationStatus::TimedOut => Err(format!(
                    "confirmation timed out; check signature {signature} before retrying"
                )
                .into()),
            }
        }

        Commands::Run {
            image,
            spec,
            mime,
            collection,
        } => {
            let uploader = build_uploader(config)?;
            let authority = Arc::new(identity::resolve_signer(&config.identity)?);
            let chain: Arc<dyn ChainClient> = Arc::new(MintSubmitter::new(&config.chain)?);
            let shutdown = Arc::new(Shutdown::new());

            // Ctrl-C stops watching; a submitted transaction may still land.
            let interrupt = Arc::clone(&shutdown);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, cancelling run");
                    interrupt.trigger();
                }
            });

            let orchestrator = MintOrchestrator::new(
                uploader,
                chain,
                authority,
                OrchestratorSettings::from(config),
                shutdown,
            );

            let image_bytes = std::fs::read(&image)?;
            let image_mime = mime.unwrap_or_else(|| mime_for_path(&image).to_string());
            let spec: MetadataSpec = serde_json::from_str(&std::fs::read_to_string(&spec)?)?;
            let job = MintJob {
                image: image_bytes,
                image_mime,
                metadata: spec,
                is_collection: collection,
            };

            match orchestrator.run(job).await {
                Ok(outcome) => {
                    println!("signature: {}", outcome.signature);
                    println!("mint: {}", outcome.mint_address);
                    if let Some(slot) = outcome.confirmed_at_slot {
                        println!("slot: {slot}");
                    }
                    Ok(())
                }
                Err(failure) => {
                    if let Some(signature) = failure.signature {
                        eprintln!("signature: {signature} (verify on chain before retrying)");
                    }
                    Err(failure.into())
                }
            }
        }
    }
}

fn build_uploader(config: &MinterConfig) -> Result<Uploader, Box<dyn std::error::Error>> {
    let store = Arc::new(HttpContentStore::new(&config.storage)?);
    let cache = match &config.cache.persistence_path {
        Some(path) => ArtifactCache::load_or_default(path),
        None => ArtifactCache::new(None),
    };
    Ok(Uploader::new(store, cache, RetryPolicy::from(&config.retry)))
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
