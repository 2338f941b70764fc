//! Content upload stage.
//!
//! # Responsibilities
//! - Fingerprint the payload and consult the artifact cache
//! - On a miss, upload with bounded retry and record the result
//! - Reject empty payloads before any network call

use std::sync::Arc;
use thiserror::Error;

use crate::cache::{ArtifactCache, UploadRecord};
use crate::observability::metrics;
use crate::resilience::retry::{retry_with_backoff, RetryPolicy};
use crate::storage::client::{ContentStore, StoreError, JSON_MIME};
use crate::storage::fingerprint::{to_canonical_json, Fingerprint};

/// Errors that can occur in the upload stage.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Caller error; never retried and never sent to the network.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Upload gave up. Nothing was cached.
    #[error("upload failed after {attempts} attempt(s): {cause}")]
    Failed { attempts: u32, cause: StoreError },
}

/// The upload stage: fingerprinting, caching, and retry around a content store.
pub struct Uploader {
    store: Arc<dyn ContentStore>,
    cache: ArtifactCache,
    policy: RetryPolicy,
}

impl Uploader {
    /// Create an upload stage over the given store and cache.
    pub fn new(store: Arc<dyn ContentStore>, cache: ArtifactCache, policy: RetryPolicy) -> Self {
        Self {
            store,
            cache,
            policy,
        }
    }

    /// Upload raw bytes; returns the stored URI.
    pub async fn upload_bytes(&self, bytes: &[u8], mime: &str) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::InvalidInput("empty payload"));
        }
        let fingerprint = Fingerprint::of_bytes(bytes);
        self.upload_inner(bytes, mime, fingerprint, "binary").await
    }

    /// Upload a JSON document in canonical form; returns the stored URI.
    pub async fn upload_document(
        &self,
        document: &serde_json::Value,
    ) -> Result<String, UploadError> {
        if document.is_null() {
            return Err(UploadError::InvalidInput("null document"));
        }
        if document.as_object().is_some_and(|o| o.is_empty()) {
            return Err(UploadError::InvalidInput("empty document"));
        }
        let canonical = to_canonical_json(document);
        let fingerprint = Fingerprint::of_document(document);
        self.upload_inner(canonical.as_bytes(), JSON_MIME, fingerprint, "document")
            .await
    }

    /// The artifact cache backing this stage.
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    async fn upload_inner(
        &self,
        bytes: &[u8],
        mime: &str,
        fingerprint: Fingerprint,
        kind: &'static str,
    ) -> Result<String, UploadError> {
        if let Some(record) = self.cache.get(&fingerprint) {
            metrics::record_cache_lookup(true);
            tracing::debug!(
                fingerprint = %fingerprint,
                uri = %record.uri,
                "cache hit, skipping upload"
            );
            return Ok(record.uri);
        }
        metrics::record_cache_lookup(false);

        let result = retry_with_backoff(&self.policy, StoreError::is_transient, |attempt| {
            if attempt > 1 {
                metrics::record_upload_retry();
            }
            let store = Arc::clone(&self.store);
            async move {
                tracing::debug!(attempt, kind, size = bytes.len(), "uploading to content store");
                store.upload(bytes, mime).await
            }
        })
        .await;

        match result {
            Ok(uri) => {
                // Racing uploads of the same content keep the first URI.
                let retained = self.cache.put(UploadRecord::new(&fingerprint, uri));
                if let Err(e) = self.cache.save_to_file() {
                    tracing::warn!(error = %e, "failed to persist artifact cache");
                }
                metrics::record_upload(kind);
                tracing::info!(
                    fingerprint = %fingerprint,
                    uri = %retained.uri,
                    kind,
                    "upload complete"
                );
                Ok(retained.uri)
            }
            Err(failure) => {
                tracing::error!(
                    fingerprint = %fingerprint,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "upload exhausted retries"
                );
                Err(UploadError::Failed {
                    attempts: failure.attempts,
                    cause: failure.error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store double that fails the first `fail_first` calls with a network
    /// error, then answers with a content-derived URI.
    struct ScriptedStore {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl ScriptedStore {
        fn new(fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_first,
            })
        }

        fn calls(&self) -> u32 {
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

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    fn uploader(store: Arc<ScriptedStore>) -> Uploader {
        Uploader::new(store, ArtifactCache::new(None), fast_policy())
    }

    #[tokio::test]
    async fn test_identical_bytes_upload_once() {
        let store = ScriptedStore::new(0);
        let uploader = uploader(Arc::clone(&store));

        let first = uploader.upload_bytes(b"same bytes", "image/png").await.unwrap();
        let second = uploader.upload_bytes(b"same bytes", "image/png").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.calls(), 1);
        assert_eq!(uploader.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_payload_fails_before_network() {
        let store = ScriptedStore::new(0);
        let uploader = uploader(Arc::clone(&store));

        let err = uploader.upload_bytes(b"", "image/png").await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidInput(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let store = ScriptedStore::new(2);
        let uploader = uploader(Arc::clone(&store));

        let uri = uploader.upload_bytes(b"flaky", "image/png").await.unwrap();
        assert!(uri.starts_with("mock://"));
        assert_eq!(store.calls(), 3);
        assert_eq!(uploader.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_cache_nothing() {
        let store = ScriptedStore::new(5);
        let uploader = uploader(Arc::clone(&store));

        let err = uploader.upload_bytes(b"down", "image/png").await.unwrap_err();
        match err {
            UploadError::Failed { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.calls(), 3);
        assert!(uploader.cache().is_empty());
    }

    #[tokio::test]
    async fn test_document_and_binary_share_cache_logic() {
        let store = ScriptedStore::new(0);
        let uploader = uploader(Arc::clone(&store));

        let doc = serde_json::json!({"name": "X", "symbol": "XX"});
        let reordered = serde_json::json!({"symbol": "XX", "name": "X"});

        let first = uploader.upload_document(&doc).await.unwrap();
        let second = uploader.upload_document(&reordered).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_null_document_rejected() {
        let store = ScriptedStore::new(0);
        let uploader = uploader(Arc::clone(&store));

        let err = uploader
            .upload_document(&serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidInput(_)));
        assert_eq!(store.calls(), 0);
    }
}
