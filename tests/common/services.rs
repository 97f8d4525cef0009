//! Test doubles and service wiring for end-to-end runs

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use submission_intake::config::{AuditConfig, FetchConfig};
use submission_intake::{
    ArtifactFetcher, NotificationError, Notifier, ObjectArtifactStore, Pipeline, SqliteAuditLog,
};
use tempfile::TempDir;

/// Notifier capturing every message it is asked to send
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl CapturingNotifier {
    /// A notifier whose every send fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Messages sent so far as (recipient, body)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn notify(&self, address: &str, status_text: &str) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery(
                "554 transaction failed".to_string(),
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), status_text.to_string()));
        Ok(())
    }
}

/// Pipeline wired to an in-memory store, a SQLite audit log and a capturing notifier
pub struct Service {
    pub pipeline: Pipeline,
    pub store: Arc<ObjectArtifactStore>,
    pub notifier: Arc<CapturingNotifier>,
    pub audit: Arc<SqliteAuditLog>,
    pub bucket: String,
    _temp_dir: TempDir,
}

/// Build a service with the given notifier
pub async fn service_with(notifier: CapturingNotifier) -> Service {
    let temp_dir = tempfile::tempdir().unwrap();
    let bucket = "csye6225-submissions".to_string();

    let store = Arc::new(ObjectArtifactStore::in_memory(bucket.clone()));
    let notifier = Arc::new(notifier);
    let audit = Arc::new(
        SqliteAuditLog::open(&AuditConfig {
            database_path: temp_dir.path().join("audit.db"),
            table_name: "EmailTracking".to_string(),
        })
        .await
        .unwrap(),
    );

    let pipeline = Pipeline::new(
        ArtifactFetcher::new(&FetchConfig::default()).unwrap(),
        store.clone(),
        notifier.clone(),
        audit.clone(),
    );

    Service {
        pipeline,
        store,
        notifier,
        audit,
        bucket,
        _temp_dir: temp_dir,
    }
}

/// Build a service with a working notifier
pub async fn service() -> Service {
    service_with(CapturingNotifier::default()).await
}
