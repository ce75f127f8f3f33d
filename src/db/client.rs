//! Database client for the working copy.
//!
//! There is no pool: each tool call opens its own connection, runs one
//! transaction and closes the connection again. SQLite's file locking (WAL
//! journal plus the driver's busy timeout) isolates concurrent calls.

use crate::error::{DbError, DbResult};
use futures_util::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to one SQLite file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl Database {
    /// Create a client for an existing database file.
    ///
    /// Every connection is opened with foreign keys enforced, WAL journaling
    /// and `synchronous = NORMAL`. These must be connection options: SQLite
    /// ignores `journal_mode` and `foreign_keys` pragmas issued inside a
    /// transaction.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);
        Self { path, options }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with the baseline settings applied.
    pub async fn connect(&self) -> DbResult<SqliteConnection> {
        debug!(path = %self.path.display(), "Opening connection");
        SqliteConnection::connect_with(&self.options)
            .await
            .map_err(DbError::from)
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back and returns the original
    /// error otherwise. The connection is closed on every path; a failed close
    /// is logged and never replaces the result.
    ///
    /// ```ignore
    /// let count = db
    ///     .with_transaction(|conn| Box::pin(async move { count_rows(conn, "Album").await }))
    ///     .await?;
    /// ```
    pub async fn with_transaction<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, DbResult<T>> + Send,
    {
        let mut conn = self.connect().await?;
        let result = run_in_transaction(&mut conn, f).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close connection");
        }
        result
    }
}

async fn run_in_transaction<T, F>(conn: &mut SqliteConnection, f: F) -> DbResult<T>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, DbResult<T>>,
{
    let mut tx = conn.begin().await?;

    match f(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            } else {
                debug!(error = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}
