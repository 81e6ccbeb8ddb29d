//! Query exercises similar to a base exercise.

use anyhow::Result;
use lexirec_recommend::RecommendationEngine;
use std::path::PathBuf;
use std::sync::Arc;

use super::common::open_existing;

pub async fn similar(
    exercise_id: i64,
    database: Option<PathBuf>,
    limit: usize,
    min_sim: f32,
    lambda: f32,
    query: Option<String>,
) -> Result<()> {
    let store = Arc::new(open_existing(database)?);
    let engine = RecommendationEngine::with_default_model(Arc::clone(&store));

    let result =
        engine.similar_detailed(exercise_id, limit, min_sim, lambda, query.as_deref())?;

    match result.tier {
        Some(tier) => println!(
            "Found {} similar exercises (tier: {})\n",
            result.items.len(),
            tier.label()
        ),
        None => {
            println!("No similar exercises found");
            return Ok(());
        }
    }

    for ranked in &result.items {
        let question = store
            .first_question_text(ranked.exercise.id)?
            .unwrap_or_default();
        println!(
            "#{:<6} sim={:.3}  [{} / {} / {}]",
            ranked.exercise.id,
            ranked.similarity,
            ranked.exercise.lesson_level,
            ranked.exercise.lesson_type,
            ranked.exercise.exercise_type,
        );

        let snippet: String = question.chars().take(100).collect();
        println!("   {}", snippet.trim());
        println!();
    }

    Ok(())
}
