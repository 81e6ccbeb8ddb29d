//! Similarity retrieval with tiered filter relaxation.

use super::RecommendationEngine;
use crate::ranking::{cosine_similarity, mmr_select};
use crate::results::{RankedExercise, RelaxationTier, SimilarResult};
use anyhow::Result;
use lexirec_embeddings::vector_from_bytes;
use lexirec_store::{CandidateFilter, ExerciseInfo};
use std::collections::HashMap;
use tracing::{debug, warn};

impl RecommendationEngine {
    /// Exercises similar to `base_id`, most relevant first.
    ///
    /// When `query_text` is given (and non-blank) it is encoded as the query
    /// vector, biasing retrieval toward the concepts the text engages with;
    /// otherwise the base exercise's stored embedding is used, indexing it on
    /// the fly if missing. Retrieval proceeds through three relaxation tiers
    /// (same topic and type, same topic, unconstrained) and stops at the
    /// first tier with a non-empty selection; stricter tiers coming back
    /// empty is expected, not an error.
    pub fn similar_exercises(
        &self,
        base_id: i64,
        top_k: usize,
        min_sim: f32,
        lambda: f32,
        query_text: Option<&str>,
    ) -> Result<Vec<RankedExercise>> {
        Ok(self
            .similar_detailed(base_id, top_k, min_sim, lambda, query_text)?
            .items)
    }

    /// Like [`similar_exercises`](Self::similar_exercises) but also reports
    /// which relaxation tier produced the result.
    pub fn similar_detailed(
        &self,
        base_id: i64,
        top_k: usize,
        min_sim: f32,
        lambda: f32,
        query_text: Option<&str>,
    ) -> Result<SimilarResult> {
        let Some(base) = self.store.get_exercise(base_id)? else {
            debug!("Base exercise {} not found", base_id);
            return Ok(SimilarResult::empty());
        };

        let Some(query) = self.query_vector(&base, query_text)? else {
            debug!("No query vector available for exercise {}", base_id);
            return Ok(SimilarResult::empty());
        };

        for tier in RelaxationTier::CASCADE {
            let (same_topic, same_type) = tier.constraints();
            let items = self.similar_tier(&base, &query, top_k, min_sim, lambda, same_topic, same_type)?;
            if !items.is_empty() {
                debug!(
                    base = base_id,
                    tier = tier.label(),
                    results = items.len(),
                    "Similarity query matched"
                );
                return Ok(SimilarResult {
                    items,
                    tier: Some(tier),
                });
            }
        }

        Ok(SimilarResult::empty())
    }

    /// Resolve the query vector: encoded query text, else the stored base
    /// embedding (lazily indexing once if missing).
    fn query_vector(
        &self,
        base: &ExerciseInfo,
        query_text: Option<&str>,
    ) -> Result<Option<Vec<f32>>> {
        if let Some(text) = query_text.map(str::trim).filter(|t| !t.is_empty()) {
            match self.model.embed(text) {
                Ok(v) => return Ok(Some(v)),
                Err(e) => {
                    debug!("Failed to embed query text, falling back to base embedding: {}", e);
                }
            }
        }

        self.base_vector(base.id)
    }

    fn base_vector(&self, exercise_id: i64) -> Result<Option<Vec<f32>>> {
        for attempt in 0..2 {
            if let Some(record) = self.store.get_embedding(exercise_id)? {
                match vector_from_bytes(&record.vector, record.dim as usize) {
                    Ok(v) => return Ok(Some(v)),
                    Err(e) => {
                        warn!("Stored embedding for exercise {} is invalid: {}", exercise_id, e);
                        return Ok(None);
                    }
                }
            }
            if attempt == 0 {
                if let Err(e) = self.index_exercise(exercise_id) {
                    debug!("On-the-fly indexing of exercise {} failed: {}", exercise_id, e);
                    return Ok(None);
                }
            }
        }
        Ok(None)
    }

    /// One retrieval tier: structural filters, similarity floor, MMR.
    #[allow(clippy::too_many_arguments)]
    fn similar_tier(
        &self,
        base: &ExerciseInfo,
        query: &[f32],
        top_k: usize,
        min_sim: f32,
        lambda: f32,
        same_topic: bool,
        same_type: bool,
    ) -> Result<Vec<RankedExercise>> {
        let pool = self.candidates_with_vectors(base, same_topic, same_type)?;

        let surviving: Vec<(ExerciseInfo, Vec<f32>)> = pool
            .into_iter()
            .filter(|(_, v)| cosine_similarity(query, v) >= min_sim)
            .collect();
        if surviving.is_empty() {
            return Ok(Vec::new());
        }

        let k = top_k.min(surviving.len());
        let ranked = mmr_select(query, &surviving, k, lambda);

        Ok(ranked
            .into_iter()
            .map(|(exercise, similarity)| RankedExercise {
                exercise,
                similarity,
            })
            .collect())
    }

    /// Structurally filtered candidates joined to their decoded embeddings.
    ///
    /// Candidates without a stored embedding are silently excluded; they just
    /// have not been indexed yet. Candidates are ordered by id, which fixes
    /// the iteration order MMR uses to break float ties.
    fn candidates_with_vectors(
        &self,
        base: &ExerciseInfo,
        same_topic: bool,
        same_type: bool,
    ) -> Result<Vec<(ExerciseInfo, Vec<f32>)>> {
        let pair = self.store.lesson_language_pair(base.lesson_id)?;
        let (native_language, target_language) = match pair {
            Some((nl, tl)) => (Some(nl), Some(tl)),
            None => (None, None),
        };

        let filter = CandidateFilter {
            exclude_id: base.id,
            level: base.lesson_level.clone(),
            native_language,
            target_language,
            lesson_type: same_topic.then(|| base.lesson_type.clone()),
            exercise_type: same_type.then(|| base.exercise_type.clone()),
        };

        let infos = self.store.candidate_exercises(&filter)?;
        let ids: Vec<i64> = infos.iter().map(|e| e.id).collect();
        let mut vectors: HashMap<i64, Vec<f32>> = HashMap::new();
        for record in self.store.embeddings_for(&ids)? {
            match vector_from_bytes(&record.vector, record.dim as usize) {
                Ok(v) => {
                    vectors.insert(record.exercise_id, v);
                }
                Err(e) => {
                    warn!("Skipping invalid embedding for exercise {}: {}", record.exercise_id, e);
                }
            }
        }

        Ok(infos
            .into_iter()
            .filter_map(|info| vectors.remove(&info.id).map(|v| (info, v)))
            .collect())
    }
}
