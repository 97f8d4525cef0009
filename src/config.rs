//! Configuration types for submission-intake
//!
//! A [`Config`] is built once at startup (usually via [`Config::from_env`]) and
//! handed by reference to each component constructor.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Which object store backs the artifact store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible object storage
    #[default]
    S3,
    /// Directory on the local filesystem
    Local,
    /// In-process store (tests, dry runs)
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::config(
                format!("unknown storage backend '{}'", other),
                "STORAGE_BACKEND",
            )),
        }
    }
}

/// Artifact store settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind (default: s3)
    #[serde(default)]
    pub backend: StorageBackend,

    /// Destination bucket (container) name
    pub bucket: String,

    /// Custom endpoint for S3-compatible providers (e.g. "http://localhost:9000")
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Root directory for the local backend (default: "./artifacts")
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: String::new(),
            endpoint: None,
            root: default_storage_root(),
        }
    }
}

/// Storage provider credentials
///
/// Supplied as base64-encoded JSON so the whole bundle fits in one
/// environment variable.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialBundle {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Optional session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<String>,
}

impl CredentialBundle {
    /// Decode a base64-encoded JSON credential bundle
    pub fn decode(encoded: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::config(format!("credential bundle is not base64: {}", e), "ACCOUNTKEY"))?;
        serde_json::from_slice(&raw).map_err(|e| {
            Error::config(
                format!("credential bundle is not valid JSON: {}", e),
                "ACCOUNTKEY",
            )
        })
    }
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Outbound email settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Sender address for outcome emails
    pub from_address: String,

    /// SMTP relay host (default: "localhost")
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP port (default: 587)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Use STARTTLS (default: true)
    #[serde(default = "default_true")]
    pub smtp_starttls: bool,

    /// SMTP username
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password
    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            from_address: String::new(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_starttls: true,
            smtp_username: None,
            smtp_password: None,
        }
    }
}

/// Audit log settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditConfig {
    /// SQLite database file (default: "./audit.db")
    #[serde(default = "default_audit_database_path")]
    pub database_path: PathBuf,

    /// Table receiving audit records (default: "submission_audit")
    #[serde(default = "default_audit_table")]
    pub table_name: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            database_path: default_audit_database_path(),
            table_name: default_audit_table(),
        }
    }
}

/// Artifact fetch settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout for the artifact GET (default: 30s)
    #[serde(default = "default_fetch_timeout")]
    pub timeout: Duration,

    /// User-Agent header sent with artifact requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// HTTP trigger surface settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind the trigger server to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Main configuration for the intake service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Provider region (default: "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Artifact store settings
    pub storage: StorageConfig,

    /// Storage provider credentials (falls back to the provider's own discovery)
    #[serde(default)]
    pub credentials: Option<CredentialBundle>,

    /// Outbound email settings
    pub notification: NotificationConfig,

    /// Audit log settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Artifact fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// HTTP trigger surface settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            storage: StorageConfig::default(),
            credentials: None,
            notification: NotificationConfig::default(),
            audit: AuditConfig::default(),
            fetch: FetchConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Build configuration from process environment variables
    ///
    /// Required: `BUCKETNAME`, `FROMADDRESS`.
    ///
    /// Optional: `REGION`, `ACCOUNTKEY` (base64 JSON credential bundle),
    /// `DYNAMODBNAME` (audit table), `AUDIT_DATABASE_PATH`, `STORAGE_BACKEND`,
    /// `STORAGE_ENDPOINT`, `STORAGE_ROOT`, `SMTP_HOST`, `SMTP_PORT`,
    /// `SMTP_STARTTLS`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `FETCH_TIMEOUT_SECS`,
    /// `BIND_ADDRESS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::config(format!("{} is not set", key), key))
        };

        let mut config = Config::default();

        if let Some(region) = get("REGION") {
            config.region = region;
        }

        config.storage.bucket = require("BUCKETNAME")?;
        if let Some(backend) = get("STORAGE_BACKEND") {
            config.storage.backend = backend.parse()?;
        }
        config.storage.endpoint = get("STORAGE_ENDPOINT");
        if let Some(root) = get("STORAGE_ROOT") {
            config.storage.root = PathBuf::from(root);
        }

        config.credentials = get("ACCOUNTKEY")
            .map(|encoded| CredentialBundle::decode(&encoded))
            .transpose()?;

        config.notification.from_address = require("FROMADDRESS")?;
        if let Some(host) = get("SMTP_HOST") {
            config.notification.smtp_host = host;
        }
        if let Some(port) = get("SMTP_PORT") {
            config.notification.smtp_port = parse_value(&port, "SMTP_PORT")?;
        }
        if let Some(starttls) = get("SMTP_STARTTLS") {
            config.notification.smtp_starttls = parse_value(&starttls, "SMTP_STARTTLS")?;
        }
        config.notification.smtp_username = get("SMTP_USERNAME");
        config.notification.smtp_password = get("SMTP_PASSWORD");

        if let Some(table) = get("DYNAMODBNAME") {
            config.audit.table_name = table;
        }
        if let Some(path) = get("AUDIT_DATABASE_PATH") {
            config.audit.database_path = PathBuf::from(path);
        }

        if let Some(secs) = get("FETCH_TIMEOUT_SECS") {
            config.fetch.timeout = Duration::from_secs(parse_value(&secs, "FETCH_TIMEOUT_SECS")?);
        }

        if let Some(addr) = get("BIND_ADDRESS") {
            config.api.bind_address = parse_value(&addr, "BIND_ADDRESS")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.trim().is_empty() {
            return Err(Error::config("bucket name must not be empty", "BUCKETNAME"));
        }
        if self.notification.from_address.trim().is_empty() {
            return Err(Error::config(
                "sender address must not be empty",
                "FROMADDRESS",
            ));
        }
        if !is_valid_table_name(&self.audit.table_name) {
            return Err(Error::config(
                format!(
                    "audit table name '{}' must be a plain SQL identifier",
                    self.audit.table_name
                ),
                "DYNAMODBNAME",
            ));
        }
        if self.fetch.timeout.is_zero() {
            return Err(Error::config(
                "fetch timeout must be greater than zero",
                "FETCH_TIMEOUT_SECS",
            ));
        }
        Ok(())
    }
}

/// Whether `name` can be interpolated into SQL as a table identifier
pub(crate) fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_value<T>(raw: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("invalid value '{}': {}", raw, e), key))
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_audit_database_path() -> PathBuf {
    PathBuf::from("./audit.db")
}

fn default_audit_table() -> String {
    "submission_audit".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("submission-intake/{}", env!("CARGO_PKG_VERSION"))
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
