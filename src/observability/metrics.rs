//! Metrics collection.
//!
//! # Metrics
//! - `minter_uploads_total` (counter): successful uploads by payload kind
//! - `minter_upload_retries_total` (counter): re-attempted upload calls
//! - `minter_cache_lookups_total` (counter): artifact cache lookups by outcome
//! - `minter_cache_entries` (gauge): current artifact cache size
//! - `minter_rpc_failovers_total` (counter): RPC calls that moved past an endpoint
//! - `minter_mint_runs_total` (counter): pipeline runs by terminal outcome

use metrics::{counter, gauge};

/// Record a successful upload of the given payload kind.
pub fn record_upload(kind: &'static str) {
    counter!("minter_uploads_total", "kind" => kind).increment(1);
}

/// Record an upload attempt beyond the first.
pub fn record_upload_retry() {
    counter!("minter_upload_retries_total").increment(1);
}

/// Record an artifact cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("minter_cache_lookups_total", "outcome" => outcome).increment(1);
}

/// Record the current artifact cache size.
pub fn record_cache_size(size: usize) {
    gauge!("minter_cache_entries").set(size as f64);
}

/// Record an RPC endpoint failure that caused failover to the next endpoint.
pub fn record_rpc_failover() {
    counter!("minter_rpc_failovers_total").increment(1);
}

/// Record the terminal outcome of a pipeline run.
pub fn record_mint_outcome(outcome: &'static str) {
    counter!("minter_mint_runs_total", "outcome" => outcome).increment(1);
}
