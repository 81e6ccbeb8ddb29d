//! Attempt log operations for ContentStore.
//!
//! The attempt table is append-only: rows are never updated or deleted in
//! normal operation.

use super::ContentStore;
use crate::schema::AttemptRecord;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct AttemptInsert {
    pub user_id: i64,
    pub exercise_id: i64,
    pub is_correct: bool,
    pub score: Option<f64>,
    pub user_answer: Option<String>,
    pub topic: String,
    pub skill: String,
}

impl ContentStore {
    pub fn insert_attempt(&self, attempt: &AttemptInsert) -> Result<i64> {
        let created_at = Self::now_secs()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO exercise_attempts
                 (user_id, exercise_id, is_correct, score, user_answer, topic, skill, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    attempt.user_id,
                    attempt.exercise_id,
                    attempt.is_correct,
                    attempt.score,
                    attempt.user_answer,
                    attempt.topic,
                    attempt.skill,
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Ids of every exercise the user has attempted, correct or not.
    pub fn attempted_exercise_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT DISTINCT exercise_id FROM exercise_attempts WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<Result<HashSet<_>, _>>()?;
            Ok(ids)
        })
    }

    /// The user's most recent incorrect attempt, if any.
    pub fn last_failed_attempt(&self, user_id: i64) -> Result<Option<AttemptRecord>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, user_id, exercise_id, is_correct, score, user_answer, topic, skill, created_at
                     FROM exercise_attempts
                     WHERE user_id = ?1 AND is_correct = 0
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                    [user_id],
                    |row| {
                        Ok(AttemptRecord {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            exercise_id: row.get(2)?,
                            is_correct: row.get(3)?,
                            score: row.get(4)?,
                            user_answer: row.get(5)?,
                            topic: row.get(6)?,
                            skill: row.get(7)?,
                            created_at: row.get(8)?,
                        })
                    },
                )
                .optional()?;
            Ok(result)
        })
    }
}
