//! Show store statistics.

use anyhow::Result;
use std::path::PathBuf;

use super::common::{open_existing, resolve_db_path};

pub async fn stats(database: Option<PathBuf>) -> Result<()> {
    let db_path = resolve_db_path(database.clone())?;
    let store = open_existing(database)?;
    let stats = store.get_stats()?;

    println!("Lexirec Store Statistics");
    println!("========================");
    println!("Database: {:?}", db_path);
    println!();
    println!("Catalog:");
    println!("  Lessons: {}", stats.lesson_count);
    println!("  Exercises: {}", stats.exercise_count);
    println!("  Embeddings: {}", stats.embedding_count);
    println!();
    println!("Activity:");
    println!("  Attempts: {}", stats.attempt_count);
    println!("  Weakness rows: {}", stats.weakness_count);
    println!("  Unserved recommendations: {}", stats.unserved_count);

    Ok(())
}
