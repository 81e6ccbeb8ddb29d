//! Rebuild embeddings for the full exercise catalog.

use anyhow::Result;
use lexirec_recommend::RecommendationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::common::open_existing;

pub async fn reindex(database: Option<PathBuf>) -> Result<()> {
    let store = Arc::new(open_existing(database)?);
    let engine = RecommendationEngine::with_default_model(store);

    let start = Instant::now();
    let indexed = engine.index_all()?;
    let elapsed = start.elapsed();

    info!("Reindex finished in {:.2}s", elapsed.as_secs_f64());
    println!("Embeddings generated for {} exercises", indexed);

    Ok(())
}
