//! Trigger payload parsing
//!
//! The upstream pub/sub transport delivers an envelope of the form
//! `{"Records":[{"Sns":{"Message":"<json>"}}]}` whose first message is a JSON
//! submission object. Direct callers may also send the submission object
//! without the envelope.

use crate::error::EventError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound submission descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEvent {
    /// Opaque submission identifier (non-empty)
    pub id: String,
    /// Address the outcome is reported to
    pub email: String,
    /// Locator of the submitted artifact
    pub submission_url: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Records")]
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    #[serde(rename = "Sns")]
    sns: SnsNotification,
}

#[derive(Deserialize)]
struct SnsNotification {
    #[serde(rename = "Message")]
    message: String,
}

impl SubmissionEvent {
    /// Parse a raw trigger payload
    ///
    /// A payload with a top-level `Records` key is treated as the pub/sub
    /// envelope and only its first record is read. Any other JSON object is
    /// read as a bare submission, which lets `POST /events` be driven without
    /// wrapping. This is an extension of the envelope format: a bare object
    /// must still carry all three non-empty string fields, and a malformed
    /// envelope never falls back to bare parsing.
    pub fn parse(raw: &[u8]) -> Result<Self, EventError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| EventError::InvalidPayload(e.to_string()))?;

        if value.get("Records").is_some() {
            let envelope: Envelope = serde_json::from_value(value)
                .map_err(|e| EventError::InvalidPayload(e.to_string()))?;
            let record = envelope
                .records
                .into_iter()
                .next()
                .ok_or(EventError::NoRecords)?;
            let message: Value = serde_json::from_str(&record.sns.message)
                .map_err(|e| EventError::InvalidMessage(e.to_string()))?;
            Self::from_message(&message)
        } else {
            Self::from_message(&value)
        }
    }

    fn from_message(message: &Value) -> Result<Self, EventError> {
        if !message.is_object() {
            return Err(EventError::InvalidMessage(
                "expected a JSON object".to_string(),
            ));
        }
        Ok(Self {
            id: required_str(message, "id")?,
            email: required_str(message, "email")?,
            submission_url: required_str(message, "submission_url")?,
        })
    }

    /// Object key this submission is stored under
    pub fn storage_key(&self) -> String {
        storage_key(&self.id)
    }
}

/// Derive the storage key for a submission id
pub fn storage_key(submission_id: &str) -> String {
    format!("{}.zip", submission_id)
}

fn required_str(message: &Value, field: &'static str) -> Result<String, EventError> {
    match message.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(EventError::MissingField(field)),
    }
}
