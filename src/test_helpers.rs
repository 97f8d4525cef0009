//! Shared test helpers: recording collaborators and payload builders.

use crate::audit::{AuditRecord, AuditRecorder};
use crate::config::FetchConfig;
use crate::error::{AuditWriteError, NotificationError, StorageError};
use crate::fetch::ArtifactFetcher;
use crate::notify::Notifier;
use crate::pipeline::Pipeline;
use crate::storage::{ArtifactStore, ObjectArtifactStore, StoredArtifactRef};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Notifier that records every message, or fails every send
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, address: &str, status_text: &str) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery("relay refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), status_text.to_string()));
        Ok(())
    }
}

/// Audit sink that keeps records in memory, or fails every write
#[derive(Default)]
pub(crate) struct RecordingAudit {
    pub records: Mutex<Vec<AuditRecord>>,
    pub fail: bool,
}

impl RecordingAudit {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditRecorder for RecordingAudit {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditWriteError> {
        if self.fail {
            return Err(AuditWriteError::Write {
                id: record.id.clone(),
                reason: "table unavailable".to_string(),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Store whose every write is refused upstream
pub(crate) struct RefusingStore {
    pub bucket: String,
    pub reason: String,
}

#[async_trait]
impl ArtifactStore for RefusingStore {
    async fn store(
        &self,
        submission_id: &str,
        _bytes: Bytes,
    ) -> Result<StoredArtifactRef, StorageError> {
        Err(StorageError::Write {
            bucket: self.bucket.clone(),
            key: crate::event::storage_key(submission_id),
            reason: self.reason.clone(),
        })
    }

    async fn load(&self, key: &str) -> Result<Bytes, StorageError> {
        Err(StorageError::Read {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            reason: self.reason.clone(),
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// A pipeline wired to an in-memory store and recording collaborators
pub(crate) struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<ObjectArtifactStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAudit>,
}

pub(crate) fn harness_with(notifier: RecordingNotifier, audit: RecordingAudit) -> Harness {
    let store = Arc::new(ObjectArtifactStore::in_memory("submissions"));
    let notifier = Arc::new(notifier);
    let audit = Arc::new(audit);
    let pipeline = Pipeline::new(
        ArtifactFetcher::new(&FetchConfig::default()).unwrap(),
        store.clone(),
        notifier.clone(),
        audit.clone(),
    );
    Harness {
        pipeline,
        store,
        notifier,
        audit,
    }
}

pub(crate) fn harness() -> Harness {
    harness_with(RecordingNotifier::default(), RecordingAudit::default())
}

/// Wrap a submission in the pub/sub envelope
pub(crate) fn payload(id: &str, email: &str, url: &str) -> Vec<u8> {
    let message = json!({"id": id, "email": email, "submission_url": url});
    json!({"Records": [{"Sns": {"Message": message.to_string()}}]})
        .to_string()
        .into_bytes()
}
