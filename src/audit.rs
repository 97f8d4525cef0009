//! Append-only audit log of pipeline outcomes
//!
//! Each run appends exactly one [`AuditRecord`]. Records are never updated or
//! deleted; re-delivered events produce additional rows for the same id.

use crate::config::{AuditConfig, is_valid_table_name};
use crate::error::{AuditWriteError, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// One audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuditRecord {
    /// Submission id
    pub id: String,
    /// Address the outcome was sent to
    pub email: String,
    /// Epoch milliseconds when the record was created
    pub timestamp: i64,
    /// Outcome string, identical to the email body
    pub status: String,
}

impl AuditRecord {
    /// Create a record stamped with the current time
    pub fn now(id: impl Into<String>, email: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            status: status.into(),
        }
    }
}

/// Durable sink for audit records
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns an [`AuditWriteError`] on upstream failure. The caller treats
    /// this as fatal.
    async fn record(&self, record: &AuditRecord) -> std::result::Result<(), AuditWriteError>;
}

/// [`AuditRecorder`] backed by a SQLite table
#[derive(Clone)]
pub struct SqliteAuditLog {
    pool: SqlitePool,
    table: String,
}

impl SqliteAuditLog {
    /// Open (creating if needed) the audit database and table
    pub async fn open(config: &AuditConfig) -> std::result::Result<Self, AuditWriteError> {
        if !is_valid_table_name(&config.table_name) {
            return Err(AuditWriteError::InvalidTable(config.table_name.clone()));
        }

        if let Some(parent) = config.database_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AuditWriteError::Open(format!("failed to create database directory: {}", e))
            })?;
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", config.database_path.display()))
                .map_err(|e| AuditWriteError::Open(format!("failed to parse database path: {}", e)))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AuditWriteError::Open(format!("failed to connect to database: {}", e)))?;

        let log = Self {
            pool,
            table: config.table_name.clone(),
        };
        log.create_table().await?;

        info!(
            path = ?config.database_path,
            table = %log.table,
            "audit log opened"
        );
        Ok(log)
    }

    async fn create_table(&self) -> std::result::Result<(), AuditWriteError> {
        // Table name is validated as a plain identifier before interpolation.
        let create = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                email TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                status TEXT NOT NULL
            )
            "#,
            table = self.table
        );
        let index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_id ON {table}(id)",
            table = self.table
        );

        for statement in [create, index] {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AuditWriteError::Open(format!("failed to create table: {}", e)))?;
        }
        Ok(())
    }

    /// All records for a submission, oldest first
    pub async fn records_for(&self, id: &str) -> Result<Vec<AuditRecord>> {
        let query = format!(
            "SELECT id, email, timestamp, status FROM {} WHERE id = ? ORDER BY row_id ASC",
            self.table
        );
        let rows = sqlx::query_as::<_, AuditRecord>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Sqlx)?;
        Ok(rows)
    }

    /// Total number of records
    pub async fn count(&self) -> Result<i64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;
        Ok(count)
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AuditRecorder for SqliteAuditLog {
    async fn record(&self, record: &AuditRecord) -> std::result::Result<(), AuditWriteError> {
        let insert = format!(
            "INSERT INTO {} (id, email, timestamp, status) VALUES (?, ?, ?, ?)",
            self.table
        );
        sqlx::query(&insert)
            .bind(&record.id)
            .bind(&record.email)
            .bind(record.timestamp)
            .bind(&record.status)
            .execute(&self.pool)
            .await
            .map_err(|e| AuditWriteError::Write {
                id: record.id.clone(),
                reason: e.to_string(),
            })?;

        debug!(id = %record.id, timestamp = record.timestamp, "audit record appended");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_log(dir: &tempfile::TempDir) -> SqliteAuditLog {
        let config = AuditConfig {
            database_path: dir.path().join("audit").join("audit.db"),
            table_name: "EmailTracking".to_string(),
        };
        SqliteAuditLog::open(&config).await.unwrap()
    }

    #[test]
    fn record_timestamp_is_current_epoch_millis() {
        let before = chrono::Utc::now().timestamp_millis();
        let record = AuditRecord::now("sub42", "a@b.com", "status");
        let after = chrono::Utc::now().timestamp_millis();
        assert!(record.timestamp >= before && record.timestamp <= after);
    }

    #[tokio::test]
    async fn appends_and_reads_back() {
        let dir = tempdir().unwrap();
        let log = open_log(&dir).await;

        let record = AuditRecord::now("sub42", "a@b.com", "Submission file upload failed: x");
        log.record(&record).await.unwrap();

        let records = log.records_for("sub42").await.unwrap();
        assert_eq!(records, vec![record]);
        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_are_separate_rows() {
        let dir = tempdir().unwrap();
        let log = open_log(&dir).await;

        log.record(&AuditRecord::now("sub42", "a@b.com", "first"))
            .await
            .unwrap();
        log.record(&AuditRecord::now("sub42", "a@b.com", "second"))
            .await
            .unwrap();
        log.record(&AuditRecord::now("other", "c@d.com", "third"))
            .await
            .unwrap();

        let records = log.records_for("sub42").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, "first");
        assert_eq!(records[1].status, "second");
        assert!(records[0].timestamp <= records[1].timestamp);
        assert_eq!(log.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn reopening_keeps_existing_records() {
        let dir = tempdir().unwrap();
        let log = open_log(&dir).await;
        log.record(&AuditRecord::now("sub1", "a@b.com", "ok"))
            .await
            .unwrap();
        log.close().await;

        let log = open_log(&dir).await;
        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_unsafe_table_name() {
        let dir = tempdir().unwrap();
        let config = AuditConfig {
            database_path: dir.path().join("audit.db"),
            table_name: "audit; DROP TABLE x".to_string(),
        };
        assert!(matches!(
            SqliteAuditLog::open(&config).await,
            Err(AuditWriteError::InvalidTable(_))
        ));
    }

    #[tokio::test]
    async fn write_after_close_is_audit_error() {
        let dir = tempdir().unwrap();
        let log = open_log(&dir).await;
        log.close().await;

        let err = log
            .record(&AuditRecord::now("sub42", "a@b.com", "status"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditWriteError::Write { ref id, .. } if id == "sub42"));
    }
}
