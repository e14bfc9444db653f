//! SQLite storage backend
//!
//! Inserts one row per alert through a parameterized statement. The
//! connection pool is configured the same way as for any small embedded
//! deployment: WAL journal mode, normal synchronous level and a busy
//! timeout for lock contention.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use tracing::{debug, trace};

use crate::alerts::AlertRecord;

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};

const CREATE_ALERTS_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metric_name TEXT NOT NULL,
    value REAL NOT NULL,
    message TEXT NOT NULL,
    created_at INTEGER NOT NULL
)";

const INSERT_ALERT: &str =
    "INSERT INTO alerts (metric_name, value, message, created_at) VALUES (?, ?, ?, ?)";

pub struct DatabaseBackend {
    pool: Pool<Sqlite>,
}

impl DatabaseBackend {
    /// Open (or create) the database file and ensure the schema exists.
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        sqlx::query(CREATE_ALERTS_TABLE).execute(&pool).await?;

        debug!("database backend ready at {:?}", db_path.as_ref());

        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageBackend for DatabaseBackend {
    async fn store(&self, record: &AlertRecord) -> StorageResult<()> {
        // All user data goes through parameter binds, never into the
        // statement text.
        sqlx::query(INSERT_ALERT)
            .bind(&record.metric)
            .bind(record.value)
            .bind(&record.message)
            .bind(record.timestamp.timestamp_millis())
            .execute(&self.pool)
            .await?;

        trace!("inserted alert row for {}", record.metric);

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "db"
    }
}
