//! Blockchain JSON-RPC client with failover and timeout handling.
//!
//! # Responsibilities
//! - POST JSON-RPC 2.0 requests to the configured endpoints
//! - Fail over to the next endpoint on transport errors and timeouts
//! - Decode typed results for the methods the pipeline consumes

use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::chain::types::{ChainError, ChainResult};
use crate::config::schema::ChainConfig;
use crate::observability::metrics;

/// How a single JSON-RPC call failed.
enum CallFailure {
    /// No endpoint produced a response.
    Transport(String),
    /// Every endpoint exceeded the request timeout.
    Timeout(u64),
    /// A node answered with a JSON-RPC error object.
    Node { code: i64, message: String },
}

impl CallFailure {
    fn into_rpc_error(self) -> ChainError {
        match self {
            CallFailure::Transport(message) => ChainError::Rpc(message),
            CallFailure::Timeout(secs) => ChainError::Timeout(secs),
            CallFailure::Node { code, message } => {
                ChainError::Rpc(format!("node error {code}: {message}"))
            }
        }
    }
}

/// Decoded entry of a `getSignatureStatuses` response.
#[derive(Debug, Clone)]
pub struct SignatureStatus {
    pub slot: u64,
    pub err: Option<String>,
    pub confirmation: Option<String>,
}

/// Rank of a commitment level, for comparing against the configured target.
fn commitment_rank(level: &str) -> u8 {
    match level {
        "processed" => 0,
        "confirmed" => 1,
        "finalized" => 2,
        _ => 0,
    }
}

/// Whether an observed commitment level satisfies the target.
pub fn commitment_satisfied(observed: &str, target: &str) -> bool {
    commitment_rank(observed) >= commitment_rank(target)
}

/// JSON-RPC client wrapper with failover support.
pub struct RpcClient {
    /// Ordered endpoints (primary + failovers).
    endpoints: Vec<String>,
    http: reqwest::Client,
    timeout_duration: Duration,
    commitment: String,
}

impl RpcClient {
    /// Create a new RPC client from chain configuration.
    pub fn new(config: &ChainConfig) -> ChainResult<Self> {
        config
            .rpc_url
            .parse::<url::Url>()
            .map_err(|e| ChainError::Rpc(format!("invalid RPC URL '{}': {}", config.rpc_url, e)))?;

        let mut endpoints = vec![config.rpc_url.clone()];
        for url_str in &config.failover_urls {
            if url_str.parse::<url::Url>().is_ok() {
                endpoints.push(url_str.clone());
            } else {
                tracing::warn!(url = %url_str, "ignoring invalid failover RPC URL");
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .build()
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = endpoints.len() - 1,
            commitment = %config.commitment,
            "RPC client initialized"
        );

        Ok(Self {
            endpoints,
            http,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            commitment: config.commitment.clone(),
        })
    }

    /// The commitment level confirmations are measured against.
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// Number of configured endpoints (primary + failovers).
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Issue one JSON-RPC call, trying each endpoint in order.
    ///
    /// A node-level error response is returned immediately: the node
    /// understood the request, so another endpoint would answer the same.
    async fn call(&self, method: &str, params: Value) -> Result<Value, CallFailure> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut last_error = String::new();
        let mut timed_out = false;
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if i > 0 {
                metrics::record_rpc_failover();
            }
            let request = self.http.post(endpoint).json(&body).send();
            let response = match timeout(self.timeout_duration, request).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "RPC error, trying next endpoint");
                    last_error = e.to_string();
                    continue;
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, method, "RPC timeout, trying next endpoint");
                    timed_out = true;
                    continue;
                }
            };

            let payload: Value = match response.json().await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "undecodable RPC response");
                    last_error = e.to_string();
                    continue;
                }
            };

            if let Some(error) = payload.get("error") {
                return Err(CallFailure::Node {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                });
            }
            if let Some(result) = payload.get("result") {
                return Ok(result.clone());
            }
            last_error = "response carried neither result nor error".to_string();
        }

        if timed_out && last_error.is_empty() {
            Err(CallFailure::Timeout(self.timeout_duration.as_secs()))
        } else {
            Err(CallFailure::Transport(format!(
                "all RPC endpoints failed for {method}: {last_error}"
            )))
        }
    }

    /// Fetch a recent blockhash for transaction signing.
    pub async fn latest_blockhash(&self) -> ChainResult<Hash> {
        let result = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await
            .map_err(CallFailure::into_rpc_error)?;

        let blockhash = result["value"]["blockhash"]
            .as_str()
            .ok_or_else(|| ChainError::Rpc("malformed getLatestBlockhash response".to_string()))?;
        Hash::from_str(blockhash).map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Lamport balance of an account.
    pub async fn balance(&self, account: &Pubkey) -> ChainResult<u64> {
        let result = self
            .call(
                "getBalance",
                json!([account.to_string(), { "commitment": self.commitment }]),
            )
            .await
            .map_err(CallFailure::into_rpc_error)?;

        result["value"]
            .as_u64()
            .ok_or_else(|| ChainError::Rpc("malformed getBalance response".to_string()))
    }

    /// Lamports required to keep an account of `data_len` bytes rent-exempt.
    pub async fn minimum_rent_exemption(&self, data_len: usize) -> ChainResult<u64> {
        let result = self
            .call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await
            .map_err(CallFailure::into_rpc_error)?;

        result
            .as_u64()
            .ok_or_else(|| ChainError::Rpc("malformed rent exemption response".to_string()))
    }

    /// Submit a base64-encoded signed transaction.
    ///
    /// Node-level errors (preflight failure, invalid signer, insufficient
    /// fee balance) mean the submission was rejected, not that the
    /// transport failed.
    pub async fn send_transaction(&self, encoded: &str) -> ChainResult<Signature> {
        let result = self
            .call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64", "preflightCommitment": self.commitment }]),
            )
            .await
            .map_err(|failure| match failure {
                CallFailure::Node { code, message } => {
                    ChainError::Rejected(format!("node error {code}: {message}"))
                }
                other => other.into_rpc_error(),
            })?;

        let signature = result
            .as_str()
            .ok_or_else(|| ChainError::Rpc("malformed sendTransaction response".to_string()))?;
        Signature::from_str(signature).map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Look up the status of a submitted transaction, if the node has seen it.
    pub async fn signature_status(
        &self,
        signature: &Signature,
    ) -> ChainResult<Option<SignatureStatus>> {
        let result = self
            .call("getSignatureStatuses", json!([[signature.to_string()]]))
            .await
            .map_err(CallFailure::into_rpc_error)?;

        let entry = &result["value"][0];
        if entry.is_null() {
            return Ok(None);
        }

        Ok(Some(SignatureStatus {
            slot: entry["slot"].as_u64().unwrap_or_default(),
            err: if entry["err"].is_null() {
                None
            } else {
                Some(entry["err"].to_string())
            },
            confirmation: entry["confirmationStatus"].as_str().map(str::to_string),
        }))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoints", &self.endpoints.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .field("commitment", &self.commitment)
            .finish()
    }
}
