//! Artifact caching and persistence.
//!
//! Maps content fingerprints to previously obtained URIs so re-runs of the
//! pipeline skip uploads that already succeeded. The cache is shared across
//! concurrent runs; racing writers for the same fingerprint keep the first
//! recorded URI.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::observability::metrics;
use crate::storage::fingerprint::Fingerprint;

/// A completed upload: fingerprint, stored URI, and when it was recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadRecord {
    /// Fingerprint of the uploaded content.
    pub fingerprint: String,
    /// URI the store answered with.
    pub uri: String,
    /// Seconds since epoch at record time.
    pub uploaded_at: u64,
}

impl UploadRecord {
    /// Build a record for a just-completed upload.
    pub fn new(fingerprint: &Fingerprint, uri: String) -> Self {
        let uploaded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            fingerprint: fingerprint.as_str().to_string(),
            uri,
            uploaded_at,
        }
    }
}

/// A thread-safe fingerprint → URI cache with optional file persistence.
#[derive(Clone, Default)]
pub struct ArtifactCache {
    inner: Arc<DashMap<String, UploadRecord>>,
    persistence_path: Option<String>,
}

impl ArtifactCache {
    /// Create a new empty cache.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file, degrading to an empty cache if the file is
    /// missing, unreadable, or corrupt.
    pub fn load_or_default(path: &str) -> Self {
        if !Path::new(path).exists() {
            return Self::new(Some(path.to_string()));
        }
        match Self::load_from_file(path) {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(path, error = %e, "artifact cache unavailable, starting empty");
                Self::new(Some(path.to_string()))
            }
        }
    }

    /// Load from file if it exists.
    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let cache = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            let map: std::collections::HashMap<String, UploadRecord> =
                serde_json::from_reader(reader)?;

            for (fingerprint, record) in map {
                cache.inner.insert(fingerprint, record);
            }
            metrics::record_cache_size(cache.inner.len());
            tracing::info!(
                entries = cache.inner.len(),
                path,
                "loaded artifact cache"
            );
        }
        Ok(cache)
    }

    /// Save to file. No-op when persistence is not configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);

            let map: std::collections::HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();

            serde_json::to_writer(writer, &map)?;
            tracing::debug!(entries = map.len(), path = %path, "saved artifact cache");
        }
        Ok(())
    }

    /// Look up the record for a fingerprint.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<UploadRecord> {
        self.inner.get(fingerprint.as_str()).map(|r| r.value().clone())
    }

    /// Record an upload, keeping the first record when two writers race on
    /// the same fingerprint. Returns the retained record.
    pub fn put(&self, record: UploadRecord) -> UploadRecord {
        let retained = self
            .inner
            .entry(record.fingerprint.clone())
            .or_insert(record)
            .clone();
        metrics::record_cache_size(self.inner.len());
        retained
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
