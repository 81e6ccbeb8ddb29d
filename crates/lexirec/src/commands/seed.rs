//! Load a JSON catalog file into the store and index its exercises.

use anyhow::{Context, Result};
use lexirec_recommend::RecommendationEngine;
use lexirec_store::ContentStore;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::common::resolve_db_path;

fn default_sequence() -> i64 {
    10
}

fn default_difficulty() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub languages: Vec<SeedLanguage>,
    #[serde(default)]
    pub lessons: Vec<SeedLesson>,
}

#[derive(Debug, Deserialize)]
pub struct SeedLanguage {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedLesson {
    pub title_key: String,
    pub level: String,
    pub lesson_type: String,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    #[serde(default = "default_difficulty")]
    pub difficulty: i64,
    #[serde(default)]
    pub localizations: Vec<SeedLessonLocalization>,
    #[serde(default)]
    pub exercises: Vec<SeedExercise>,
}

#[derive(Debug, Deserialize)]
pub struct SeedLessonLocalization {
    pub native_language: String,
    pub target_language: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedExercise {
    pub exercise_type: String,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
    #[serde(default)]
    pub localizations: Vec<SeedExerciseLocalization>,
}

#[derive(Debug, Deserialize)]
pub struct SeedExerciseLocalization {
    pub native_language: String,
    pub target_language: String,
    pub question: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub options: Vec<SeedOption>,
}

#[derive(Debug, Deserialize)]
pub struct SeedOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

pub async fn seed(catalog_path: &Path, database: Option<PathBuf>) -> Result<()> {
    let db_path = resolve_db_path(database)?;

    let raw = fs::read_to_string(catalog_path)
        .with_context(|| format!("Failed to read catalog file {:?}", catalog_path))?;
    let catalog: SeedCatalog = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse catalog file {:?}", catalog_path))?;

    info!("Seeding catalog into {:?}", db_path);

    let store = Arc::new(ContentStore::open(&db_path)?);
    let engine = RecommendationEngine::with_default_model(Arc::clone(&store));

    for language in &catalog.languages {
        store.upsert_language(&language.code, &language.name)?;
    }

    let mut lesson_count = 0;
    let mut exercise_count = 0;
    let mut indexed_count = 0;

    for lesson in &catalog.lessons {
        let lesson_id = store.insert_lesson(
            &lesson.title_key,
            &lesson.level,
            &lesson.lesson_type,
            lesson.sequence,
            lesson.difficulty,
        )?;
        lesson_count += 1;

        for loc in &lesson.localizations {
            store.insert_lesson_localization(
                lesson_id,
                &loc.native_language,
                &loc.target_language,
                &loc.title,
                &loc.content,
                loc.primary,
            )?;
        }

        for exercise in &lesson.exercises {
            let exercise_id =
                store.insert_exercise(lesson_id, &exercise.exercise_type, exercise.sequence)?;
            exercise_count += 1;

            for loc in &exercise.localizations {
                let loc_id = store.insert_exercise_localization(
                    exercise_id,
                    &loc.native_language,
                    &loc.target_language,
                    &loc.question,
                    loc.instructions.as_deref(),
                )?;
                for option in &loc.options {
                    store.insert_exercise_option(loc_id, &option.text, option.is_correct)?;
                }
            }

            // Content-change hook: index new content right away, best-effort.
            match engine.index_exercise(exercise_id) {
                Ok(true) => indexed_count += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to index exercise {}: {}", exercise_id, e),
            }
        }
    }

    println!("Seeded {} lessons, {} exercises", lesson_count, exercise_count);
    println!("Indexed {} exercises", indexed_count);

    Ok(())
}
