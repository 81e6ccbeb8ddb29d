use rusqlite::{Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        r#"
        -- Metadata table for schema versioning
        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Language catalog (ISO-style codes)
        CREATE TABLE IF NOT EXISTS languages (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- Lesson molds, language-independent; localized text lives in
        -- lesson_localizations
        CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title_key TEXT NOT NULL,
            level TEXT NOT NULL,
            lesson_type TEXT NOT NULL,
            sequence INTEGER NOT NULL DEFAULT 10,
            difficulty INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            UNIQUE (title_key, level, lesson_type)
        );

        -- Localized lesson content for a native -> target language pair.
        -- Exactly one row per lesson carries is_primary = 1; it defines the
        -- lesson's canonical language pair.
        CREATE TABLE IF NOT EXISTS lesson_localizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lesson_id INTEGER NOT NULL,
            native_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE,
            FOREIGN KEY (native_language) REFERENCES languages(code),
            FOREIGN KEY (target_language) REFERENCES languages(code),
            UNIQUE (lesson_id, native_language, target_language)
        );

        CREATE TABLE IF NOT EXISTS exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lesson_id INTEGER NOT NULL,
            exercise_type TEXT NOT NULL,
            sequence INTEGER NOT NULL DEFAULT 10,
            FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS exercise_localizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            exercise_id INTEGER NOT NULL,
            native_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            question TEXT NOT NULL,
            instructions TEXT,
            FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE,
            FOREIGN KEY (native_language) REFERENCES languages(code),
            FOREIGN KEY (target_language) REFERENCES languages(code),
            UNIQUE (exercise_id, native_language, target_language)
        );

        CREATE TABLE IF NOT EXISTS exercise_options (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            localization_id INTEGER NOT NULL,
            text TEXT NOT NULL,
            is_correct INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (localization_id) REFERENCES exercise_localizations(id) ON DELETE CASCADE
        );

        -- One current vector per exercise (upsert semantics).
        -- Invariant: length(vector) == dim * 4 (float32 bytes).
        CREATE TABLE IF NOT EXISTS exercise_embeddings (
            exercise_id INTEGER PRIMARY KEY,
            vector BLOB NOT NULL,
            dim INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
        );

        -- Append-only attempt log
        CREATE TABLE IF NOT EXISTS exercise_attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            exercise_id INTEGER NOT NULL,
            is_correct INTEGER NOT NULL,
            score REAL,
            user_answer TEXT,
            topic TEXT NOT NULL,
            skill TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
        );

        -- Aggregated weakness state per (user, topic, skill)
        CREATE TABLE IF NOT EXISTS user_weaknesses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            topic TEXT NOT NULL,
            skill TEXT NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 0,
            errors INTEGER NOT NULL DEFAULT 0,
            error_rate REAL NOT NULL DEFAULT 0.0,
            priority REAL NOT NULL DEFAULT 0.0,
            UNIQUE (user_id, topic, skill)
        );

        -- Pending personalized recommendations
        CREATE TABLE IF NOT EXISTS recommendation_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            exercise_id INTEGER NOT NULL,
            reason TEXT NOT NULL,
            score REAL NOT NULL DEFAULT 0.0,
            created_at INTEGER NOT NULL,
            served INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (exercise_id) REFERENCES exercises(id) ON DELETE CASCADE
        );

        -- Indexes for performance
        CREATE INDEX IF NOT EXISTS idx_lessons_level_seq ON lessons(level, sequence);
        CREATE INDEX IF NOT EXISTS idx_lessons_type ON lessons(lesson_type);
        CREATE INDEX IF NOT EXISTS idx_lesson_locs_lesson ON lesson_localizations(lesson_id);
        CREATE INDEX IF NOT EXISTS idx_exercises_lesson ON exercises(lesson_id, sequence);
        CREATE INDEX IF NOT EXISTS idx_exercises_type ON exercises(exercise_type);
        CREATE INDEX IF NOT EXISTS idx_exercise_locs_exercise ON exercise_localizations(exercise_id);
        CREATE INDEX IF NOT EXISTS idx_options_loc ON exercise_options(localization_id);
        CREATE INDEX IF NOT EXISTS idx_attempts_user ON exercise_attempts(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_attempts_exercise ON exercise_attempts(exercise_id);
        CREATE INDEX IF NOT EXISTS idx_weaknesses_user ON user_weaknesses(user_id, priority);
        CREATE INDEX IF NOT EXISTS idx_queue_user_served ON recommendation_queue(user_id, served, score);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    pub id: i64,
    pub title_key: String,
    pub level: String,
    pub lesson_type: String,
    pub sequence: i64,
    pub difficulty: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// An exercise joined to its owning lesson's metadata.
///
/// This is the shape the recommendation pipeline works with: the lesson
/// fields drive the hard filters (level, topic) and the sequence-proximity
/// bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseInfo {
    pub id: i64,
    pub lesson_id: i64,
    pub exercise_type: String,
    pub sequence: i64,
    pub lesson_level: String,
    pub lesson_type: String,
    pub lesson_sequence: i64,
}

/// Everything needed to build an exercise's indexable text.
///
/// Lesson fields come from the primary lesson localization, question and
/// options from the exercise's first localization. Any of them may be absent
/// for sparsely localized content.
#[derive(Debug, Clone)]
pub struct ExerciseContext {
    pub info: ExerciseInfo,
    pub lesson_title: Option<String>,
    pub lesson_content: Option<String>,
    pub native_language: Option<String>,
    pub target_language: Option<String>,
    pub question: Option<String>,
    pub instructions: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub exercise_id: i64,
    pub vector: Vec<u8>,
    pub dim: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub user_id: i64,
    pub exercise_id: i64,
    pub is_correct: bool,
    pub score: Option<f64>,
    pub user_answer: Option<String>,
    pub topic: String,
    pub skill: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaknessRecord {
    pub id: i64,
    pub user_id: i64,
    pub topic: String,
    pub skill: String,
    pub attempts: i64,
    pub errors: i64,
    pub error_rate: f64,
    pub priority: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    pub id: i64,
    pub user_id: i64,
    pub exercise_id: i64,
    pub reason: String,
    pub score: f64,
    pub created_at: i64,
    pub served: bool,
}
