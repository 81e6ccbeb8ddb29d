//! User weakness state operations for ContentStore.

use super::ContentStore;
use crate::schema::WeaknessRecord;
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

fn weakness_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WeaknessRecord> {
    Ok(WeaknessRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        topic: row.get(2)?,
        skill: row.get(3)?,
        attempts: row.get(4)?,
        errors: row.get(5)?,
        error_rate: row.get(6)?,
        priority: row.get(7)?,
    })
}

const WEAKNESS_COLUMNS: &str =
    "id, user_id, topic, skill, attempts, errors, error_rate, priority";

impl ContentStore {
    /// Fetch the weakness row for (user, topic, skill), creating a zeroed one
    /// if it does not exist.
    pub fn get_or_create_weakness(
        &self,
        user_id: i64,
        topic: &str,
        skill: &str,
    ) -> Result<WeaknessRecord> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_weaknesses (user_id, topic, skill) VALUES (?1, ?2, ?3)",
                params![user_id, topic, skill],
            )?;
            let record = conn.query_row(
                &format!(
                    "SELECT {WEAKNESS_COLUMNS} FROM user_weaknesses
                     WHERE user_id = ?1 AND topic = ?2 AND skill = ?3"
                ),
                params![user_id, topic, skill],
                weakness_from_row,
            )?;
            Ok(record)
        })
    }

    /// Write back the mutable counters of a weakness row.
    pub fn update_weakness(&self, weakness: &WeaknessRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE user_weaknesses
                 SET attempts = ?1, errors = ?2, error_rate = ?3, priority = ?4
                 WHERE id = ?5",
                params![
                    weakness.attempts,
                    weakness.errors,
                    weakness.error_rate,
                    weakness.priority,
                    weakness.id,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_weakness(
        &self,
        user_id: i64,
        topic: &str,
        skill: &str,
    ) -> Result<Option<WeaknessRecord>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    &format!(
                        "SELECT {WEAKNESS_COLUMNS} FROM user_weaknesses
                         WHERE user_id = ?1 AND topic = ?2 AND skill = ?3"
                    ),
                    params![user_id, topic, skill],
                    weakness_from_row,
                )
                .optional()?;
            Ok(result)
        })
    }

    /// The user's single most urgent weakness, by priority then error rate.
    pub fn top_weakness(&self, user_id: i64) -> Result<Option<WeaknessRecord>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    &format!(
                        "SELECT {WEAKNESS_COLUMNS} FROM user_weaknesses
                         WHERE user_id = ?1
                         ORDER BY priority DESC, error_rate DESC LIMIT 1"
                    ),
                    [user_id],
                    weakness_from_row,
                )
                .optional()?;
            Ok(result)
        })
    }
}
