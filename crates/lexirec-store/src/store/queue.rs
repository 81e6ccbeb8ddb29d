//! Recommendation queue operations for ContentStore.

use super::ContentStore;
use crate::schema::QueueRecord;
use anyhow::Result;
use rusqlite::params;
use tracing::debug;

fn queue_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueRecord> {
    Ok(QueueRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        exercise_id: row.get(2)?,
        reason: row.get(3)?,
        score: row.get(4)?,
        created_at: row.get(5)?,
        served: row.get(6)?,
    })
}

impl ContentStore {
    /// Insert an unserved recommendation unless one already exists for
    /// (user, exercise).
    ///
    /// The existence check and insert run while the connection lock is held,
    /// which serializes writers within one process. Concurrent processes can
    /// still race and produce duplicate unserved rows; that is an accepted
    /// data-quality limitation, not a crash condition.
    pub fn enqueue_if_absent(
        &self,
        user_id: i64,
        exercise_id: i64,
        reason: &str,
        score: f64,
    ) -> Result<bool> {
        let created_at = Self::now_secs()?;
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM recommendation_queue
                 WHERE user_id = ?1 AND exercise_id = ?2 AND served = 0)",
                params![user_id, exercise_id],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO recommendation_queue (user_id, exercise_id, reason, score, created_at, served)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![user_id, exercise_id, reason, score, created_at],
            )?;
            debug!(
                "Queued exercise {} for user {} (score {:.3})",
                exercise_id, user_id, score
            );
            Ok(true)
        })
    }

    /// Unserved recommendations for a user, best score first.
    pub fn unserved_for(&self, user_id: i64, limit: usize) -> Result<Vec<QueueRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, exercise_id, reason, score, created_at, served
                 FROM recommendation_queue
                 WHERE user_id = ?1 AND served = 0
                 ORDER BY score DESC, id LIMIT ?2",
            )?;
            let results = stmt
                .query_map(params![user_id, limit as i64], queue_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
    }

    /// Flag queue rows as served. Returns the number of rows updated.
    pub fn mark_served(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn(|conn| {
            let placeholders: String = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let query = format!(
                "UPDATE recommendation_queue SET served = 1 WHERE id IN ({})",
                placeholders
            );
            let params: Vec<&dyn rusqlite::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
            let updated = conn.execute(&query, params.as_slice())?;
            Ok(updated)
        })
    }
}
