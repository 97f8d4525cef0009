//! # submission-intake
//!
//! Event-triggered intake for ZIP submissions.
//!
//! Each trigger payload describes one submission (`id`, `email`,
//! `submission_url`). A run fetches the artifact, checks that it is a
//! non-empty ZIP, stores it as `{id}.zip`, then emails the outcome to the
//! submitter and appends an audit record with the same status text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use submission_intake::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::from_config(&config).await?;
//!
//!     let raw = br#"{"Records":[{"Sns":{"Message":"{\"id\":\"sub42\",\"email\":\"a@b.com\",\"submission_url\":\"https://x/y/sub42.zip\"}"}}]}"#;
//!     let result = pipeline.run(raw).await;
//!     println!("{} {}", result.status_code, result.body);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP trigger surface
pub mod api;
/// Append-only audit log
pub mod audit;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Trigger payload parsing
pub mod event;
/// Artifact retrieval
pub mod fetch;
/// Outcome notification
pub mod notify;
/// Pipeline orchestration
pub mod pipeline;
/// Artifact storage
pub mod storage;
/// Archive validation
pub mod validation;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use audit::{AuditRecord, AuditRecorder, SqliteAuditLog};
pub use config::{Config, CredentialBundle, StorageBackend};
pub use error::{
    AuditWriteError, Error, EventError, FormatError, IntakeError, NotificationError, ReportError,
    Result, RetrievalError, StorageError,
};
pub use event::SubmissionEvent;
pub use fetch::{ArtifactBytes, ArtifactFetcher};
pub use notify::{Notifier, SmtpNotifier};
pub use pipeline::{Pipeline, PipelineOutcome, RunResult};
pub use storage::{ArtifactStore, ObjectArtifactStore, StoredArtifactRef};
pub use validation::{InvalidReason, ValidationResult, validate};

/// Resolves once the process is asked to stop (SIGINT or SIGTERM, Ctrl+C
/// only on non-unix targets)
///
/// A handler that cannot be installed is logged and never fires, so the
/// server keeps serving until the remaining signal arrives.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "interrupt handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown requested, draining in-flight events");
}
