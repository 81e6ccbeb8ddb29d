//! Exercise indexing: builds indexable text and stores embeddings.

use super::RecommendationEngine;
use crate::text::exercise_text;
use anyhow::Result;
use lexirec_embeddings::vector_to_bytes;
use tracing::{debug, info, warn};

/// Bulk indexing batch size; each batch is encoded in one call and committed
/// in one transaction.
const INDEX_BATCH: usize = 128;

impl RecommendationEngine {
    /// Index a single exercise, overwriting any stored vector.
    ///
    /// Returns `false` when the exercise does not exist or has no indexable
    /// text; neither is an error.
    pub fn index_exercise(&self, exercise_id: i64) -> Result<bool> {
        let Some(ctx) = self.store.get_exercise_context(exercise_id)? else {
            debug!("Exercise {} not found, nothing to index", exercise_id);
            return Ok(false);
        };

        let text = exercise_text(&ctx);
        if text.is_empty() {
            debug!("Exercise {} has no indexable text, skipping", exercise_id);
            return Ok(false);
        }

        let vector = self.model.embed(&text)?;
        self.store
            .upsert_embedding(exercise_id, &vector_to_bytes(&vector), vector.len())?;
        debug!("Indexed exercise {} (dim={})", exercise_id, vector.len());
        Ok(true)
    }

    /// Reindex the full catalog in batches. Returns the number of exercises
    /// indexed.
    ///
    /// Safe to re-run: the upsert leaves exactly one vector per exercise. A
    /// single exercise failing to load is skipped rather than failing the
    /// batch.
    pub fn index_all(&self) -> Result<usize> {
        let ids = self.store.all_exercise_ids()?;
        let mut total = 0;

        for batch in ids.chunks(INDEX_BATCH) {
            let mut texts = Vec::new();
            let mut batch_ids = Vec::new();

            for &id in batch {
                match self.store.get_exercise_context(id) {
                    Ok(Some(ctx)) => {
                        let text = exercise_text(&ctx);
                        if !text.is_empty() {
                            texts.push(text);
                            batch_ids.push(id);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Skipping exercise {}: {}", id, e);
                    }
                }
            }

            if batch_ids.is_empty() {
                continue;
            }

            let vectors = self.model.embed_batch(&texts)?;
            let entries: Vec<(i64, Vec<u8>, usize)> = batch_ids
                .iter()
                .zip(vectors.iter())
                .map(|(&id, v)| (id, vector_to_bytes(v), v.len()))
                .collect();

            self.store.upsert_embeddings_batch(&entries)?;
            total += entries.len();

            if total % (INDEX_BATCH * 4) == 0 {
                info!("Indexed {} exercises...", total);
            }
        }

        info!("Indexing complete: {} exercises", total);
        Ok(total)
    }
}
