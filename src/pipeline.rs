//! Pipeline orchestration
//!
//! A run has two zones:
//! - **intake** (fetch, validate, store): every failure is contained and
//!   folded into the [`PipelineOutcome`] string
//! - **report** (notify, then audit): always executed once an event parsed,
//!   and any failure escalates to an internal-error [`RunResult`]
//!
//! A payload that does not parse is fatal before either zone runs.

use crate::audit::{AuditRecord, AuditRecorder, SqliteAuditLog};
use crate::config::Config;
use crate::error::{Error, IntakeError, ReportError, Result};
use crate::event::SubmissionEvent;
use crate::fetch::ArtifactFetcher;
use crate::notify::{Notifier, SmtpNotifier};
use crate::storage::{ArtifactStore, ObjectArtifactStore, StoredArtifactRef};
use crate::validation::validate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Prefix of the outcome string when the artifact was stored
pub const SUCCESS_PREFIX: &str = "Submission file upload successfully: ";

/// Prefix of the outcome string when intake failed
pub const FAILURE_PREFIX: &str = "Submission file upload failed: ";

/// Body returned with a 200 result
pub const SUCCESS_BODY: &str = "Email sent and tracking completed";

/// Body returned with a 500 result
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Status text shared by the email body and the audit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    status: String,
    success: bool,
}

impl PipelineOutcome {
    /// Outcome for a stored artifact
    pub fn success(stored: &StoredArtifactRef) -> Self {
        Self {
            status: format!("{}{}", SUCCESS_PREFIX, stored),
            success: true,
        }
    }

    /// Outcome for a contained intake failure
    pub fn failure(err: &IntakeError) -> Self {
        Self {
            status: format!("{}{}", FAILURE_PREFIX, err.description()),
            success: false,
        }
    }

    /// Human-readable status text
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether the artifact was stored
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl std::fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.status)
    }
}

/// Coarse result reported to the invoking system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// 200 on full success, 500 on any fatal failure
    pub status_code: u16,
    /// JSON-serialized message
    pub body: String,
}

impl RunResult {
    /// Parsing, notification and audit all completed
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            body: json_string(SUCCESS_BODY),
        }
    }

    /// The run aborted
    pub fn internal_error() -> Self {
        Self {
            status_code: 500,
            body: json_string(INTERNAL_ERROR_BODY),
        }
    }

    /// Whether the run completed without escalation
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// The submission-intake pipeline
///
/// Holds only shared, immutable handles, so one instance can serve many
/// concurrent runs.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: ArtifactFetcher,
    store: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditRecorder>,
}

impl Pipeline {
    /// Assemble a pipeline from its collaborators
    pub fn new(
        fetcher: ArtifactFetcher,
        store: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditRecorder>,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            audit,
        }
    }

    /// Build the production pipeline from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let fetcher =
            ArtifactFetcher::new(&config.fetch).map_err(|e| Error::Intake(e.into()))?;
        let store = ObjectArtifactStore::from_config(config).map_err(|e| Error::Intake(e.into()))?;
        let notifier = SmtpNotifier::from_config(&config.notification)
            .map_err(|e| Error::Report(e.into()))?;
        let audit = SqliteAuditLog::open(&config.audit)
            .await
            .map_err(|e| Error::Report(e.into()))?;

        Ok(Self::new(
            fetcher,
            Arc::new(store),
            Arc::new(notifier),
            Arc::new(audit),
        ))
    }

    /// Run the pipeline for one raw trigger payload
    pub async fn run(&self, raw_event: &[u8]) -> RunResult {
        match self.run_payload(raw_event).await {
            Ok(outcome) => {
                info!(success = outcome.is_success(), "pipeline run completed");
                RunResult::ok()
            }
            Err(e) => {
                error!(error = %e, "pipeline run failed");
                RunResult::internal_error()
            }
        }
    }

    /// Parse a raw payload and process it
    pub async fn run_payload(&self, raw_event: &[u8]) -> Result<PipelineOutcome> {
        let event = SubmissionEvent::parse(raw_event)?;
        self.process(&event).await
    }

    /// Process an already parsed submission
    ///
    /// Returns the outcome when notification and audit both succeeded.
    pub async fn process(&self, event: &SubmissionEvent) -> Result<PipelineOutcome> {
        info!(
            submission_id = %event.id,
            email = %event.email,
            url = %event.submission_url,
            "processing submission"
        );

        let outcome = self.intake(event).await;
        self.report(event, &outcome).await?;
        Ok(outcome)
    }

    async fn intake(&self, event: &SubmissionEvent) -> PipelineOutcome {
        match self.fetch_validate_store(event).await {
            Ok(stored) => {
                info!(submission_id = %event.id, location = %stored, "submission stored");
                PipelineOutcome::success(&stored)
            }
            Err(e) => {
                warn!(
                    submission_id = %event.id,
                    kind = e.kind(),
                    error = %e,
                    "submission intake failed"
                );
                PipelineOutcome::failure(&e)
            }
        }
    }

    async fn fetch_validate_store(
        &self,
        event: &SubmissionEvent,
    ) -> std::result::Result<StoredArtifactRef, IntakeError> {
        let artifact = self.fetcher.fetch(&event.submission_url).await?;
        validate(&artifact.url, &artifact.bytes).into_result()?;
        let stored = self.store.store(&event.id, artifact.bytes).await?;
        Ok(stored)
    }

    async fn report(
        &self,
        event: &SubmissionEvent,
        outcome: &PipelineOutcome,
    ) -> std::result::Result<(), ReportError> {
        self.notifier.notify(&event.email, outcome.status()).await?;

        let record = AuditRecord::now(&event.id, &event.email, outcome.status());
        self.audit.record(&record).await?;
        Ok(())
    }
}
