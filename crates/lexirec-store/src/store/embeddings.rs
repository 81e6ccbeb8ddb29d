//! Exercise embedding operations for ContentStore.

use super::ContentStore;
use crate::schema::EmbeddingRecord;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{MutexGuard, PoisonError};
use tracing::debug;

impl ContentStore {
    /// Insert or overwrite the embedding for an exercise.
    pub fn upsert_embedding(&self, exercise_id: i64, vector: &[u8], dim: usize) -> Result<()> {
        let updated_at = Self::now_secs()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO exercise_embeddings (exercise_id, vector, dim, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![exercise_id, vector, dim as i64, updated_at],
            )?;
            Ok(())
        })
    }

    /// Upsert a batch of embeddings in one transaction.
    ///
    /// A crash mid-reindex leaves earlier batches committed and later ones
    /// unindexed; the reindex is idempotent so re-running recovers.
    pub fn upsert_embeddings_batch(&self, entries: &[(i64, Vec<u8>, usize)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let updated_at = Self::now_secs()?;

        let conn = self
            .conn
            .lock()
            .map_err(|e: PoisonError<MutexGuard<Connection>>| {
                anyhow!("Database lock poisoned: {}", e)
            })?;

        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| -> Result<()> {
            let mut stmt = conn.prepare(
                "INSERT OR REPLACE INTO exercise_embeddings (exercise_id, vector, dim, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (exercise_id, vector, dim) in entries {
                stmt.execute(params![exercise_id, vector, *dim as i64, updated_at])?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                debug!("Upserted {} embeddings", entries.len());
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    pub fn get_embedding(&self, exercise_id: i64) -> Result<Option<EmbeddingRecord>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT exercise_id, vector, dim, updated_at FROM exercise_embeddings
                     WHERE exercise_id = ?1",
                    [exercise_id],
                    |row| {
                        Ok(EmbeddingRecord {
                            exercise_id: row.get(0)?,
                            vector: row.get(1)?,
                            dim: row.get(2)?,
                            updated_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(result)
        })
    }

    /// Embeddings for the given exercise ids. Exercises without a stored
    /// vector are simply absent from the result.
    pub fn embeddings_for(&self, exercise_ids: &[i64]) -> Result<Vec<EmbeddingRecord>> {
        if exercise_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let placeholders: String = exercise_ids
                .iter()
                .map(|_| "?")
                .collect::<Vec<_>>()
                .join(",");
            let query = format!(
                "SELECT exercise_id, vector, dim, updated_at FROM exercise_embeddings
                 WHERE exercise_id IN ({})
                 ORDER BY exercise_id",
                placeholders
            );

            let mut stmt = conn.prepare(&query)?;
            let params: Vec<&dyn rusqlite::ToSql> = exercise_ids
                .iter()
                .map(|id| id as &dyn rusqlite::ToSql)
                .collect();

            let results = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(EmbeddingRecord {
                        exercise_id: row.get(0)?,
                        vector: row.get(1)?,
                        dim: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(results)
        })
    }
}
