//! Artifact store adapter
//!
//! Validated archives are written to `{submission_id}.zip` in the configured
//! bucket. Writes overwrite; there is no versioning or collision handling.

use crate::config::{Config, StorageBackend};
use crate::error::StorageError;
use crate::event::storage_key;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Location of a stored artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifactRef {
    /// Bucket (container) the artifact was written to
    pub bucket: String,
    /// Object key within the bucket
    pub key: String,
}

impl std::fmt::Display for StoredArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Durable storage for validated submission archives
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `bytes` under the key derived from `submission_id`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the upstream write fails.
    async fn store(
        &self,
        submission_id: &str,
        bytes: Bytes,
    ) -> Result<StoredArtifactRef, StorageError>;

    /// Read back the object stored under `key`
    async fn load(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Bucket name writes go to
    fn bucket(&self) -> &str;
}

/// [`ArtifactStore`] backed by any `object_store` implementation
#[derive(Clone)]
pub struct ObjectArtifactStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectArtifactStore {
    /// Wrap an existing object store
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// In-process store, contents are lost on drop
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket)
    }

    /// Build the store selected by configuration
    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        let bucket = config.storage.bucket.clone();
        let store: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(InMemory::new()),
            StorageBackend::Local => {
                let root = config.storage.root.join(&bucket);
                std::fs::create_dir_all(&root).map_err(|e| {
                    StorageError::Config(format!(
                        "failed to create storage directory {}: {}",
                        root.display(),
                        e
                    ))
                })?;
                let fs = LocalFileSystem::new_with_prefix(&root)
                    .map_err(|e| StorageError::Config(e.to_string()))?;
                Arc::new(fs)
            }
            StorageBackend::S3 => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_region(config.region.clone())
                    .with_bucket_name(bucket.clone());

                if let Some(creds) = &config.credentials {
                    builder = builder
                        .with_access_key_id(creds.access_key_id.clone())
                        .with_secret_access_key(creds.secret_access_key.clone());
                    if let Some(token) = &creds.session_token {
                        builder = builder.with_token(token.clone());
                    }
                }

                if let Some(endpoint) = &config.storage.endpoint {
                    builder = builder
                        .with_endpoint(endpoint.clone())
                        .with_allow_http(endpoint.starts_with("http://"));
                }

                let s3 = builder
                    .build()
                    .map_err(|e| StorageError::Config(e.to_string()))?;
                Arc::new(s3)
            }
        };

        info!(
            backend = ?config.storage.backend,
            bucket = %bucket,
            "artifact store initialized"
        );

        Ok(Self { store, bucket })
    }
}

#[async_trait]
impl ArtifactStore for ObjectArtifactStore {
    async fn store(
        &self,
        submission_id: &str,
        bytes: Bytes,
    ) -> Result<StoredArtifactRef, StorageError> {
        let key = storage_key(submission_id);
        let size = bytes.len();
        let location = object_path(&key).map_err(|reason| {
            warn!(bucket = %self.bucket, key = %key, reason = %reason, "rejected artifact key");
            StorageError::Write {
                bucket: self.bucket.clone(),
                key: key.clone(),
                reason,
            }
        })?;

        self.store
            .put(&location, bytes.into())
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %location,
                    size_bytes = size,
                    "artifact upload failed"
                );
                StorageError::Write {
                    bucket: self.bucket.clone(),
                    key: key.clone(),
                    reason: e.to_string(),
                }
            })?;

        info!(bucket = %self.bucket, key = %location, size_bytes = size, "artifact uploaded");

        Ok(StoredArtifactRef {
            bucket: self.bucket.clone(),
            key: location.to_string(),
        })
    }

    async fn load(&self, key: &str) -> Result<Bytes, StorageError> {
        let read_err = |e: object_store::Error| StorageError::Read {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            reason: e.to_string(),
        };

        let location = object_path(key).map_err(|reason| StorageError::Read {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            reason,
        })?;
        let result = self.store.get(&location).await.map_err(read_err)?;
        result.bytes().await.map_err(read_err)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Object location for `key`, taken verbatim
///
/// Keys the store would rewrite (leading or trailing `/`, empty, `.` or `..`
/// segments, control characters) are rejected, so the written location is
/// always exactly `key`.
fn object_path(key: &str) -> Result<Path, String> {
    let location = Path::parse(key).map_err(|e| e.to_string())?;
    if location.as_ref() != key {
        return Err(format!("{key:?} is not a canonical object path"));
    }
    Ok(location)
}
