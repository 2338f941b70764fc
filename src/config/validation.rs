//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempt counts, poll intervals)
//! - Check endpoint URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: MinterConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::MinterConfig;

const COMMITMENT_LEVELS: [&str; 3] = ["processed", "confirmed", "finalized"];

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn violation(errors: &mut Vec<ValidationError>, field: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.into(),
    });
}

/// Validate a deserialized configuration, collecting every violation.
pub fn validate_config(config: &MinterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.storage.endpoint.parse::<url::Url>().is_err() {
        violation(&mut errors, "storage.endpoint", "not a valid URL");
    }
    if config.storage.request_timeout_secs == 0 {
        violation(&mut errors, "storage.request_timeout_secs", "must be at least 1");
    }

    if config.chain.rpc_url.parse::<url::Url>().is_err() {
        violation(&mut errors, "chain.rpc_url", "not a valid URL");
    }
    for (i, failover) in config.chain.failover_urls.iter().enumerate() {
        if failover.parse::<url::Url>().is_err() {
            violation(
                &mut errors,
                &format!("chain.failover_urls[{i}]"),
                "not a valid URL",
            );
        }
    }
    if !COMMITMENT_LEVELS.contains(&config.chain.commitment.as_str()) {
        violation(
            &mut errors,
            "chain.commitment",
            format!("must be one of {COMMITMENT_LEVELS:?}"),
        );
    }
    if config.chain.rpc_timeout_secs == 0 {
        violation(&mut errors, "chain.rpc_timeout_secs", "must be at least 1");
    }
    if config.chain.confirm_poll_interval_ms == 0 {
        violation(&mut errors, "chain.confirm_poll_interval_ms", "must be at least 1");
    }

    if config.retry.max_attempts == 0 {
        violation(&mut errors, "retry.max_attempts", "must be at least 1");
    }
    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        violation(
            &mut errors,
            "retry.max_delay_ms",
            "must be at least base_delay_ms",
        );
    }

    if config.pipeline.max_concurrent_runs == 0 {
        violation(&mut errors, "pipeline.max_concurrent_runs", "must be at least 1");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
