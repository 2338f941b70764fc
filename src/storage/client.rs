//! Content store client over an HTTP gateway.
//!
//! # Responsibilities
//! - POST raw bytes (with their MIME type) or JSON documents to the gateway
//! - Attach the configured bearer token
//! - Map transport and gateway failures into the store error taxonomy

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::StorageConfig;
use crate::storage::fingerprint::to_canonical_json;

/// MIME type used for JSON document uploads.
pub const JSON_MIME: &str = "application/json";

/// Errors that can occur while talking to the content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {body}")]
    Service { status: u16, body: String },

    /// The gateway answered 2xx but without a usable URI or content ID.
    #[error("gateway response carried neither uri nor cid")]
    MalformedResponse,
}

impl StoreError {
    /// Whether a retry can reasonably succeed.
    ///
    /// Network failures and gateway 5xx responses are transient; 4xx
    /// responses are caller errors and fail immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Service { status, .. } => *status >= 500,
            StoreError::MalformedResponse => false,
        }
    }
}

/// Client capability for a content-addressed store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload raw bytes with their MIME type; returns the stored URI.
    async fn upload(&self, bytes: &[u8], mime: &str) -> Result<String, StoreError>;

    /// Upload a JSON document in canonical form; returns the stored URI.
    async fn upload_json(&self, document: &serde_json::Value) -> Result<String, StoreError> {
        self.upload(to_canonical_json(document).as_bytes(), JSON_MIME)
            .await
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    uri: Option<String>,
    cid: Option<String>,
}

/// Content store adapter over an HTTP upload gateway.
pub struct HttpContentStore {
    endpoint: String,
    api_token: Option<String>,
    uri_scheme: String,
    http: reqwest::Client,
}

impl HttpContentStore {
    /// Create a new gateway client.
    pub fn new(config: &StorageConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            uri_scheme: config.uri_scheme.clone(),
            http,
        })
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload(&self, bytes: &[u8], mime: &str) -> Result<String, StoreError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, mime)
            .body(bytes.to_vec());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        match (parsed.uri, parsed.cid) {
            (Some(uri), _) => Ok(uri),
            (None, Some(cid)) => Ok(format!("{}://{}", self.uri_scheme, cid)),
            (None, None) => Err(StoreError::MalformedResponse),
        }
    }
}

impl std::fmt::Debug for HttpContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentStore")
            .field("endpoint", &self.endpoint)
            .field("uri_scheme", &self.uri_scheme)
            .field("has_token", &self.api_token.is_some())
            .finish()
    }
}
