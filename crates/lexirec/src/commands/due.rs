//! Show the due-for-review list for a user.

use anyhow::Result;
use lexirec_recommend::RecommendationEngine;
use std::path::PathBuf;
use std::sync::Arc;

use super::common::open_existing;

pub async fn due(user_id: i64, database: Option<PathBuf>, limit: usize) -> Result<()> {
    let store = Arc::new(open_existing(database)?);
    let engine = RecommendationEngine::with_default_model(Arc::clone(&store));

    let exercises = engine.due_for(user_id, limit)?;
    if exercises.is_empty() {
        println!("Nothing due for user {}", user_id);
        return Ok(());
    }

    println!("Due for user {} ({} exercises)\n", user_id, exercises.len());
    for exercise in &exercises {
        let question = store.first_question_text(exercise.id)?.unwrap_or_default();
        println!(
            "#{:<6} [{} / {} / {}]",
            exercise.id, exercise.lesson_level, exercise.lesson_type, exercise.exercise_type,
        );
        let snippet: String = question.chars().take(100).collect();
        println!("   {}", snippet.trim());
        println!();
    }

    Ok(())
}
