//! Mint transaction assembly, submission, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build the instruction sequence that creates one token
//! - Sign with the authority and the single-use mint keypair
//! - Broadcast over JSON-RPC and poll for confirmation

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::time::Duration;
use tokio::time::{interval, timeout};

use mpl_token_metadata::accounts::Metadata;
use mpl_token_metadata::instructions::CreateMetadataAccountV3Builder;
use mpl_token_metadata::types::{CollectionDetails, DataV2};
use solana_sdk::instruction::Instruction;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account;

use crate::chain::client::{commitment_satisfied, RpcClient};
use crate::chain::types::{ChainError, ChainResult, ConfirmationStatus, MintRequest};
use crate::config::schema::ChainConfig;

/// Chain capability consumed by the pipeline.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Lamport balance of an account.
    async fn balance(&self, account: &Pubkey) -> ChainResult<u64>;

    /// Sign and submit the mint transaction; returns its signature.
    async fn submit_mint(&self, request: &MintRequest) -> ChainResult<Signature>;

    /// Poll for confirmation up to `deadline`.
    async fn await_confirmation(
        &self,
        signature: &Signature,
        deadline: Duration,
    ) -> ChainResult<ConfirmationStatus>;
}

/// Build the instruction sequence for one mint: create the mint account,
/// initialize it with zero decimals, create the authority's token account,
/// mint the single unit, and attach the metadata account.
pub fn build_mint_instructions(
    request: &MintRequest,
    rent_lamports: u64,
) -> ChainResult<Vec<Instruction>> {
    let authority = request.authority.pubkey();
    let mint = request.mint_address();
    let holder_account = get_associated_token_address(&authority, &mint);
    let (metadata_account, _) = Metadata::find_pda(&mint);

    let create_mint_account = system_instruction::create_account(
        &authority,
        &mint,
        rent_lamports,
        spl_token::state::Mint::LEN as u64,
        &spl_token::id(),
    );

    let initialize_mint = spl_token::instruction::initialize_mint(
        &spl_token::id(),
        &mint,
        &authority,
        Some(&authority),
        0,
    )
    .map_err(|e| ChainError::InvalidRequest(e.to_string()))?;

    let create_holder_account =
        create_associated_token_account(&authority, &authority, &mint, &spl_token::id());

    let mint_one = spl_token::instruction::mint_to(
        &spl_token::id(),
        &mint,
        &holder_account,
        &authority,
        &[],
        1,
    )
    .map_err(|e| ChainError::InvalidRequest(e.to_string()))?;

    let mut metadata_builder = CreateMetadataAccountV3Builder::new();
    metadata_builder
        .metadata(metadata_account)
        .mint(mint)
        .mint_authority(authority)
        .payer(authority)
        .update_authority(authority, true)
        .data(DataV2 {
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            uri: request.metadata_uri.clone(),
            seller_fee_basis_points: request.seller_fee_basis_points,
            creators: None,
            collection: None,
            uses: None,
        })
        .is_mutable(true);
    if request.is_collection {
        metadata_builder.collection_details(CollectionDetails::V1 { size: 0 });
    }

    Ok(vec![
        create_mint_account,
        initialize_mint,
        create_holder_account,
        mint_one,
        metadata_builder.instruction(),
    ])
}

/// Serialize a signed transaction to the base64 wire form.
pub fn encode_transaction(transaction: &Transaction) -> ChainResult<String> {
    let bytes =
        bincode::serialize(transaction).map_err(|e| ChainError::Encoding(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

/// Chain client over JSON-RPC: builds, signs, submits, and monitors mint
/// transactions.
#[derive(Debug)]
pub struct MintSubmitter {
    rpc: RpcClient,
    poll_interval: Duration,
}

impl MintSubmitter {
    /// Create a submitter from chain configuration.
    pub fn new(config: &ChainConfig) -> ChainResult<Self> {
        Ok(Self {
            rpc: RpcClient::new(config)?,
            poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
        })
    }
}

#[async_trait]
impl ChainClient for MintSubmitter {
    async fn balance(&self, account: &Pubkey) -> ChainResult<u64> {
        self.rpc.balance(account).await
    }

    async fn submit_mint(&self, request: &MintRequest) -> ChainResult<Signature> {
        let rent_lamports = self
            .rpc
            .minimum_rent_exemption(spl_token::state::Mint::LEN)
            .await?;
        let instructions = build_mint_instructions(request, rent_lamports)?;
        let blockhash = self.rpc.latest_blockhash().await?;

        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&request.authority.pubkey()),
            &[request.authority.as_ref(), request.mint_keypair()],
            blockhash,
        );

        let signature = self.rpc.send_transaction(&encode_transaction(&transaction)?).await?;
        tracing::info!(
            signature = %signature,
            mint = %request.mint_address(),
            "mint transaction submitted"
        );
        Ok(signature)
    }

    async fn await_confirmation(
        &self,
        signature: &Signature,
        deadline: Duration,
    ) -> ChainResult<ConfirmationStatus> {
        let target = self.rpc.commitment().to_string();

        let result = timeout(deadline, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                let status = match self.rpc.signature_status(signature).await? {
                    Some(status) => status,
                    None => {
                        tracing::debug!(signature = %signature, "transaction pending");
                        continue;
                    }
                };

                if let Some(err) = status.err {
                    return Ok(ConfirmationStatus::Rejected(err));
                }

                if let Some(level) = &status.confirmation {
                    if commitment_satisfied(level, &target) {
                        return Ok(ConfirmationStatus::Confirmed { slot: status.slot });
                    }
                }

                tracing::debug!(
                    signature = %signature,
                    slot = status.slot,
                    "waiting for confirmation"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Ok(ConfirmationStatus::TimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::Keypair;
    use std::sync::Arc;

    fn request() -> MintRequest {
        MintRequest::new(
            "Gradient #1".to_string(),
            "GRAD".to_string(),
            "ipfs://meta".to_string(),
            500,
            false,
            Arc::new(Keypair::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_instruction_sequence() {
        let request = request();
        let instructions = build_mint_instructions(&request, 1_461_600).unwrap();

        assert_eq!(instructions.len(), 5);
        // The mint account is created by the system program and owned by the
        // token program afterwards.
        assert_eq!(instructions[0].program_id, solana_sdk::system_program::id());
        assert_eq!(instructions[1].program_id, spl_token::id());
        assert_eq!(instructions[3].program_id, spl_token::id());
        assert_eq!(instructions[4].program_id, mpl_token_metadata::ID);
    }

    #[test]
    fn test_transaction_signed_by_authority_and_mint() {
        let request = request();
        let instructions = build_mint_instructions(&request, 1_461_600).unwrap();

        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&request.authority.pubkey()),
            &[request.authority.as_ref(), request.mint_keypair()],
            Hash::default(),
        );

        assert_eq!(transaction.signatures.len(), 2);
        assert_eq!(
            transaction.message.account_keys[0],
            request.authority.pubkey()
        );
    }

    #[test]
    fn test_wire_encoding_is_base64() {
        let request = request();
        let instructions = build_mint_instructions(&request, 1_461_600).unwrap();
        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&request.authority.pubkey()),
            &[request.authority.as_ref(), request.mint_keypair()],
            Hash::default(),
        );

        let encoded = encode_transaction(&transaction).unwrap();
        assert!(!encoded.is_empty());
        assert!(BASE64.decode(&encoded).is_ok());
    }
}
