//! Lesson and exercise catalog operations for ContentStore.

use super::ContentStore;
use crate::schema::{ExerciseContext, ExerciseInfo, LessonRecord};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use tracing::debug;

/// Structural filters narrowing the candidate universe before similarity
/// scoring. The level filter is always present; language codes apply when the
/// base lesson's canonical pair is known; topic/type are the soft filters of
/// the relaxation tiers.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub exclude_id: i64,
    pub level: String,
    pub native_language: Option<String>,
    pub target_language: Option<String>,
    pub lesson_type: Option<String>,
    pub exercise_type: Option<String>,
}

const EXERCISE_INFO_COLUMNS: &str =
    "e.id, e.lesson_id, e.exercise_type, e.sequence, l.level, l.lesson_type, l.sequence";

fn exercise_info_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExerciseInfo> {
    Ok(ExerciseInfo {
        id: row.get(0)?,
        lesson_id: row.get(1)?,
        exercise_type: row.get(2)?,
        sequence: row.get(3)?,
        lesson_level: row.get(4)?,
        lesson_type: row.get(5)?,
        lesson_sequence: row.get(6)?,
    })
}

impl ContentStore {
    /// Register a language code, updating the display name if it exists.
    pub fn upsert_language(&self, code: &str, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO languages (code, name) VALUES (?1, ?2)",
                params![code, name],
            )?;
            Ok(())
        })
    }

    pub fn insert_lesson(
        &self,
        title_key: &str,
        level: &str,
        lesson_type: &str,
        sequence: i64,
        difficulty: i64,
    ) -> Result<i64> {
        let created_at = Self::now_secs()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO lessons (title_key, level, lesson_type, sequence, difficulty, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
                params![title_key, level, lesson_type, sequence, difficulty, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Add a localization for a lesson.
    ///
    /// The first localization inserted for a lesson becomes its primary one
    /// (defining the canonical language pair); passing `primary = true` later
    /// reassigns the flag.
    pub fn insert_lesson_localization(
        &self,
        lesson_id: i64,
        native_language: &str,
        target_language: &str,
        title: &str,
        content: &str,
        primary: bool,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            let has_primary: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM lesson_localizations WHERE lesson_id = ?1 AND is_primary = 1)",
                [lesson_id],
                |row| row.get(0),
            )?;
            let is_primary = primary || !has_primary;
            if primary && has_primary {
                conn.execute(
                    "UPDATE lesson_localizations SET is_primary = 0 WHERE lesson_id = ?1",
                    [lesson_id],
                )?;
            }

            conn.execute(
                "INSERT INTO lesson_localizations
                 (lesson_id, native_language, target_language, title, content, is_primary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![lesson_id, native_language, target_language, title, content, is_primary],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_exercise(&self, lesson_id: i64, exercise_type: &str, sequence: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO exercises (lesson_id, exercise_type, sequence) VALUES (?1, ?2, ?3)",
                params![lesson_id, exercise_type, sequence],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Inserted exercise {} for lesson {}", id, lesson_id);
            Ok(id)
        })
    }

    pub fn insert_exercise_localization(
        &self,
        exercise_id: i64,
        native_language: &str,
        target_language: &str,
        question: &str,
        instructions: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO exercise_localizations
                 (exercise_id, native_language, target_language, question, instructions)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![exercise_id, native_language, target_language, question, instructions],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_exercise_option(
        &self,
        localization_id: i64,
        text: &str,
        is_correct: bool,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO exercise_options (localization_id, text, is_correct) VALUES (?1, ?2, ?3)",
                params![localization_id, text, is_correct],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_lesson(&self, lesson_id: i64) -> Result<Option<LessonRecord>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, title_key, level, lesson_type, sequence, difficulty, is_active, created_at
                     FROM lessons WHERE id = ?1",
                    [lesson_id],
                    |row| {
                        Ok(LessonRecord {
                            id: row.get(0)?,
                            title_key: row.get(1)?,
                            level: row.get(2)?,
                            lesson_type: row.get(3)?,
                            sequence: row.get(4)?,
                            difficulty: row.get(5)?,
                            is_active: row.get(6)?,
                            created_at: row.get(7)?,
                        })
                    },
                )
                .optional()?;
            Ok(result)
        })
    }

    /// Get an exercise joined to its lesson metadata.
    pub fn get_exercise(&self, exercise_id: i64) -> Result<Option<ExerciseInfo>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    &format!(
                        "SELECT {EXERCISE_INFO_COLUMNS}
                         FROM exercises e JOIN lessons l ON e.lesson_id = l.id
                         WHERE e.id = ?1"
                    ),
                    [exercise_id],
                    exercise_info_from_row,
                )
                .optional()?;
            Ok(result)
        })
    }

    /// The canonical (native, target) language pair of a lesson, read from
    /// its primary localization.
    pub fn lesson_language_pair(&self, lesson_id: i64) -> Result<Option<(String, String)>> {
        self.with_conn(|conn| Self::lesson_language_pair_impl(conn, lesson_id))
    }

    fn lesson_language_pair_impl(
        conn: &Connection,
        lesson_id: i64,
    ) -> Result<Option<(String, String)>> {
        let result = conn
            .query_row(
                "SELECT native_language, target_language FROM lesson_localizations
                 WHERE lesson_id = ?1 ORDER BY is_primary DESC, id LIMIT 1",
                [lesson_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(result)
    }

    /// Load everything needed to build an exercise's indexable text.
    pub fn get_exercise_context(&self, exercise_id: i64) -> Result<Option<ExerciseContext>> {
        self.with_conn(|conn| {
            let info = conn
                .query_row(
                    &format!(
                        "SELECT {EXERCISE_INFO_COLUMNS}
                         FROM exercises e JOIN lessons l ON e.lesson_id = l.id
                         WHERE e.id = ?1"
                    ),
                    [exercise_id],
                    exercise_info_from_row,
                )
                .optional()?;

            let Some(info) = info else {
                return Ok(None);
            };

            let lesson_loc = conn
                .query_row(
                    "SELECT native_language, target_language, title, content
                     FROM lesson_localizations
                     WHERE lesson_id = ?1 ORDER BY is_primary DESC, id LIMIT 1",
                    [info.lesson_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            let exercise_loc = conn
                .query_row(
                    "SELECT id, question, instructions FROM exercise_localizations
                     WHERE exercise_id = ?1 ORDER BY id LIMIT 1",
                    [exercise_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()?;

            let options = if let Some((loc_id, _, _)) = &exercise_loc {
                let mut stmt = conn.prepare(
                    "SELECT text FROM exercise_options WHERE localization_id = ?1 ORDER BY id",
                )?;
                stmt.query_map([loc_id], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                Vec::new()
            };

            let (native_language, target_language, lesson_title, lesson_content) = match lesson_loc
            {
                Some((nl, tl, title, content)) => (Some(nl), Some(tl), Some(title), Some(content)),
                None => (None, None, None, None),
            };

            Ok(Some(ExerciseContext {
                info,
                lesson_title,
                lesson_content,
                native_language,
                target_language,
                question: exercise_loc.as_ref().map(|(_, q, _)| q.clone()),
                instructions: exercise_loc.and_then(|(_, _, i)| i),
                options,
            }))
        })
    }

    /// All exercise ids, ascending. Drives the bulk reindex.
    pub fn all_exercise_ids(&self) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM exercises ORDER BY id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Exercises passing the structural filters, joined to lesson metadata.
    ///
    /// Ordered by exercise id so downstream tie-breaking is deterministic for
    /// a given database state.
    pub fn candidate_exercises(&self, filter: &CandidateFilter) -> Result<Vec<ExerciseInfo>> {
        self.with_conn(|conn| {
            let mut sql = format!(
                "SELECT {EXERCISE_INFO_COLUMNS}
                 FROM exercises e JOIN lessons l ON e.lesson_id = l.id
                 WHERE e.id != ? AND l.level = ?"
            );
            let mut params: Vec<&dyn ToSql> = vec![&filter.exclude_id, &filter.level];

            if let (Some(nl), Some(tl)) = (&filter.native_language, &filter.target_language) {
                sql.push_str(
                    " AND EXISTS (SELECT 1 FROM lesson_localizations ll
                       WHERE ll.lesson_id = l.id AND ll.is_primary = 1
                         AND ll.native_language = ? AND ll.target_language = ?)",
                );
                params.push(nl);
                params.push(tl);
            }
            if let Some(lt) = &filter.lesson_type {
                sql.push_str(" AND l.lesson_type = ?");
                params.push(lt);
            }
            if let Some(et) = &filter.exercise_type {
                sql.push_str(" AND e.exercise_type = ?");
                params.push(et);
            }
            sql.push_str(" ORDER BY e.id");

            let mut stmt = conn.prepare(&sql)?;
            let results = stmt
                .query_map(params.as_slice(), exercise_info_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
    }

    /// First `limit` exercises in canonical (lesson sequence, exercise id)
    /// order. The global fallback of the due-list read path.
    pub fn catalog_page(&self, limit: usize) -> Result<Vec<ExerciseInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXERCISE_INFO_COLUMNS}
                 FROM exercises e JOIN lessons l ON e.lesson_id = l.id
                 ORDER BY l.sequence, e.id LIMIT ?1"
            ))?;
            let results = stmt
                .query_map([limit as i64], exercise_info_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
    }

    /// Exercises whose lesson has the given type, optionally constrained to a
    /// level, in canonical order.
    pub fn exercises_for_topic(
        &self,
        lesson_type: &str,
        level: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ExerciseInfo>> {
        self.with_conn(|conn| {
            let mut sql = format!(
                "SELECT {EXERCISE_INFO_COLUMNS}
                 FROM exercises e JOIN lessons l ON e.lesson_id = l.id
                 WHERE l.lesson_type = ?"
            );
            let limit = limit as i64;
            let mut params: Vec<&dyn ToSql> = vec![&lesson_type];
            if let Some(level) = &level {
                sql.push_str(" AND l.level = ?");
                params.push(level);
            }
            sql.push_str(" ORDER BY l.sequence, e.id LIMIT ?");
            params.push(&limit);

            let mut stmt = conn.prepare(&sql)?;
            let results = stmt
                .query_map(params.as_slice(), exercise_info_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
    }

    /// Question text of an exercise's first localization, if any.
    pub fn first_question_text(&self, exercise_id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT question FROM exercise_localizations
                     WHERE exercise_id = ?1 ORDER BY id LIMIT 1",
                    [exercise_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(result)
        })
    }

}
