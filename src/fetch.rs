//! Artifact retrieval over HTTP(S)

use crate::config::FetchConfig;
use crate::error::RetrievalError;
use bytes::Bytes;
use tracing::{debug, info};

/// Raw artifact payload and the locator it came from
#[derive(Debug, Clone)]
pub struct ArtifactBytes {
    /// Locator the payload was fetched from
    pub url: String,
    /// Response body
    pub bytes: Bytes,
}

impl ArtifactBytes {
    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Fetches submission artifacts with a single GET per call
///
/// The underlying client is reused across runs; no state is shared beyond the
/// connection pool.
#[derive(Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    timeout: std::time::Duration,
}

impl ArtifactFetcher {
    /// Create a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| RetrievalError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Fetch the artifact at `url`
    ///
    /// Non-2xx responses, timeouts, DNS and connection failures all surface as
    /// [`RetrievalError`]. No retry is attempted.
    pub async fn fetch(&self, url: &str) -> Result<ArtifactBytes, RetrievalError> {
        debug!(url, "fetching submission artifact");

        let response = self.client.get(url).send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("request timed out after {:?}", self.timeout)
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                e.to_string()
            };
            RetrievalError::Request {
                url: url.to_string(),
                reason,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| RetrievalError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        info!(url, size_bytes = bytes.len(), "submission artifact fetched");

        Ok(ArtifactBytes {
            url: url.to_string(),
            bytes,
        })
    }
}
