//! SQLite-based storage for the lesson catalog and recommendation state.
//!
//! This module provides the `ContentStore` type for storing and querying
//! lessons, exercises, embeddings, attempts, weaknesses and the
//! recommendation queue.

mod attempts;
mod catalog;
mod embeddings;
mod queue;
mod weakness;

use crate::schema::init_schema;
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

pub use attempts::AttemptInsert;
pub use catalog::CandidateFilter;

/// The main storage interface.
pub struct ContentStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl ContentStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        // Enable WAL mode for better concurrency
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_path_buf(),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Helper function to safely acquire the connection lock with proper error handling.
    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e: PoisonError<MutexGuard<Connection>>| {
                anyhow!("Database lock poisoned: {}", e)
            })?;
        f(&conn)
    }

    /// Current unix time in seconds.
    pub(crate) fn now_secs() -> Result<i64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System time before UNIX epoch")?
            .as_secs() as i64)
    }

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM lessons) as lesson_count,
                    (SELECT COUNT(*) FROM exercises) as exercise_count,
                    (SELECT COUNT(*) FROM exercise_embeddings) as embedding_count,
                    (SELECT COUNT(*) FROM exercise_attempts) as attempt_count,
                    (SELECT COUNT(*) FROM user_weaknesses) as weakness_count,
                    (SELECT COUNT(*) FROM recommendation_queue WHERE served = 0) as unserved_count",
                [],
                |row| {
                    Ok(StoreStats {
                        lesson_count: row.get::<_, i64>(0)? as usize,
                        exercise_count: row.get::<_, i64>(1)? as usize,
                        embedding_count: row.get::<_, i64>(2)? as usize,
                        attempt_count: row.get::<_, i64>(3)? as usize,
                        weakness_count: row.get::<_, i64>(4)? as usize,
                        unserved_count: row.get::<_, i64>(5)? as usize,
                    })
                },
            )
            .map_err(Into::into)
        })
    }
}

/// Statistics about the stored catalog and recommendation state.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub lesson_count: usize,
    pub exercise_count: usize,
    pub embedding_count: usize,
    pub attempt_count: usize,
    pub weakness_count: usize,
    pub unserved_count: usize,
}
