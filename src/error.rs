//! Error types for submission-intake
//!
//! Errors are split along the two zones of a pipeline run:
//! - [`EventError`] - the trigger payload could not be turned into a submission (fatal)
//! - [`IntakeError`] - fetch, validation or storage failed (contained, folded into the outcome)
//! - [`ReportError`] - notification or audit recording failed (fatal, escalated)
//!
//! [`Error`] wraps all of them together with the ambient failures (configuration,
//! I/O, database) that can occur while setting up the service.

use crate::validation::InvalidReason;
use thiserror::Error;

/// Result type alias for submission-intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fixed message reported for any archive that fails validation
pub const INVALID_ZIP_MESSAGE: &str = "The submission file may not be a valid ZIP file.";

/// Main error type for submission-intake
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "BUCKETNAME")
        key: Option<String>,
    },

    /// The trigger payload could not be parsed into a submission
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] EventError),

    /// Fetch, validation or storage of the artifact failed
    #[error("intake failed: {0}")]
    Intake(#[from] IntakeError),

    /// Sending the notification or writing the audit record failed
    #[error("reporting failed: {0}")]
    Report(#[from] ReportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// HTTP trigger server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Failures turning a trigger payload into a [`SubmissionEvent`](crate::event::SubmissionEvent)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The outer payload is not valid JSON
    #[error("trigger payload is not valid JSON: {0}")]
    InvalidPayload(String),

    /// The envelope carries no records
    #[error("trigger payload contains no records")]
    NoRecords,

    /// The inner message is not a JSON object
    #[error("submission message is not valid JSON: {0}")]
    InvalidMessage(String),

    /// A required field is absent, not a string, or empty
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
}

/// Transport-level failure while retrieving the artifact
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request never produced a response (DNS, connect, timeout)
    #[error("failed to fetch {url}: {reason}")]
    Request {
        /// Locator that was requested
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP error fetching {url}: status {status}")]
    Status {
        /// Locator that was requested
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// The response body could not be read
    #[error("failed to read response body from {url}: {reason}")]
    Body {
        /// Locator that was requested
        url: String,
        /// Underlying transport error
        reason: String,
    },
}

/// The artifact is not a usable ZIP archive
///
/// Every reason renders to [`INVALID_ZIP_MESSAGE`]; the reason itself is kept
/// for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", INVALID_ZIP_MESSAGE)]
pub struct FormatError {
    /// Why validation rejected the archive
    pub reason: InvalidReason,
}

/// Failure talking to the artifact store
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store backend could not be constructed
    #[error("storage configuration error: {0}")]
    Config(String),

    /// Upstream write failed
    #[error("failed to write {bucket}/{key}: {reason}")]
    Write {
        /// Bucket the write targeted
        bucket: String,
        /// Object key the write targeted
        key: String,
        /// Underlying store error
        reason: String,
    },

    /// Upstream read failed
    #[error("failed to read {bucket}/{key}: {reason}")]
    Read {
        /// Bucket the read targeted
        bucket: String,
        /// Object key the read targeted
        key: String,
        /// Underlying store error
        reason: String,
    },
}

/// Errors from the contained zone of a run (fetch, validate, store)
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Artifact could not be fetched
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Artifact is not a valid, non-empty ZIP
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Artifact could not be persisted
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntakeError {
    /// Short name of the failing step, for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::Retrieval(_) => "retrieval",
            IntakeError::Format(_) => "format",
            IntakeError::Storage(_) => "storage",
        }
    }

    /// Text placed after the failure prefix of the outcome string
    pub fn description(&self) -> String {
        match self {
            IntakeError::Retrieval(e) => e.to_string(),
            IntakeError::Format(_) => INVALID_ZIP_MESSAGE.to_string(),
            IntakeError::Storage(e) => e.to_string(),
        }
    }
}

/// Email delivery failure
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Sender or recipient address could not be parsed
    #[error("invalid email address {address}: {reason}")]
    InvalidAddress {
        /// The offending address
        address: String,
        /// Parser error
        reason: String,
    },

    /// The message could not be assembled
    #[error("failed to build email: {0}")]
    Build(String),

    /// The SMTP transport could not be configured
    #[error("failed to configure mail transport: {0}")]
    Transport(String),

    /// The delivery service rejected or failed the send
    #[error("failed to deliver email: {0}")]
    Delivery(String),
}

/// Audit log write failure
#[derive(Debug, Error)]
pub enum AuditWriteError {
    /// The configured table name is not a plain SQL identifier
    #[error("invalid audit table name: {0}")]
    InvalidTable(String),

    /// The audit database could not be opened or prepared
    #[error("failed to open audit log: {0}")]
    Open(String),

    /// The append failed
    #[error("failed to append audit record for {id}: {reason}")]
    Write {
        /// Submission id of the record
        id: String,
        /// Underlying database error
        reason: String,
    },
}

/// Errors from the escalating zone of a run (notify, audit)
#[derive(Debug, Error)]
pub enum ReportError {
    /// Notification could not be delivered
    #[error("notification failed: {0}")]
    Notification(#[from] NotificationError),

    /// Audit record could not be written
    #[error("audit write failed: {0}")]
    AuditWrite(#[from] AuditWriteError),
}
