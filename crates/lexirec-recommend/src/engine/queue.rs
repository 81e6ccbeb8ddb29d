//! Recommendation queue refresh and the layered due-list read path.

use super::{DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, RecommendationEngine};
use crate::text::{human_reason, topic_of};
use anyhow::Result;
use lexirec_store::{ExerciseInfo, QueueRecord};
use tracing::{debug, warn};

/// Candidate pool size for a queue refresh.
const QUEUE_CANDIDATE_POOL: usize = 30;

/// Upper bound on queue inserts per failed attempt.
const QUEUE_MAX_INSERTS: usize = 10;

/// Weights of the final queue score.
const SIMILARITY_WEIGHT: f64 = 0.72;
const PRIORITY_WEIGHT: f64 = 0.25;

/// Bonus when both lessons sit within this many sequence steps.
const SEQUENCE_BONUS: f64 = 0.1;
const SEQUENCE_WINDOW: i64 = 10;

/// Diversity setting for the due-list similarity fallback.
const DUE_MMR_LAMBDA: f32 = 0.65;

impl RecommendationEngine {
    /// Queue exercises similar to a just-failed one, in descending
    /// similarity order, skipping anything already attempted, already queued
    /// unserved, or textually identical to the failed question.
    pub(crate) fn refresh_queue(
        &self,
        user_id: i64,
        base: &ExerciseInfo,
        priority: f64,
        answer: Option<&str>,
    ) -> Result<usize> {
        let query_text = answer.map(str::trim).filter(|t| !t.is_empty());
        let similar = self.similar_exercises(
            base.id,
            QUEUE_CANDIDATE_POOL,
            DEFAULT_MIN_SIM,
            DEFAULT_MMR_LAMBDA,
            query_text,
        )?;
        if similar.is_empty() {
            debug!("No similar exercises for {}, queue unchanged", base.id);
            return Ok(0);
        }

        let seen = self.store.attempted_exercise_ids(user_id)?;
        let base_question = self
            .store
            .first_question_text(base.id)?
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        let reason = human_reason(&topic_of(base));

        let mut created = 0;
        for ranked in similar {
            let candidate = &ranked.exercise;
            if seen.contains(&candidate.id) {
                continue;
            }

            // Avoid recommending a near-duplicate of the question just failed.
            if let Some(base_q) = &base_question {
                let candidate_q = self
                    .store
                    .first_question_text(candidate.id)?
                    .map(|q| q.trim().to_lowercase());
                if candidate_q.as_deref() == Some(base_q.as_str()) {
                    continue;
                }
            }

            let sequence_bonus =
                if (base.lesson_sequence - candidate.lesson_sequence).abs() <= SEQUENCE_WINDOW {
                    SEQUENCE_BONUS
                } else {
                    0.0
                };
            let final_score = SIMILARITY_WEIGHT * ranked.similarity as f64
                + PRIORITY_WEIGHT * priority
                + sequence_bonus;

            if self
                .store
                .enqueue_if_absent(user_id, candidate.id, reason, final_score)?
            {
                created += 1;
                if created >= QUEUE_MAX_INSERTS {
                    break;
                }
            }
        }

        debug!(user = user_id, created, "Queue refresh finished");
        Ok(created)
    }

    /// Pop up to `limit` unserved recommendations, marking them served.
    ///
    /// Serving is a side effect of reading; a concurrent re-fetch before the
    /// flag write commits can double-deliver, which is acceptable for a
    /// best-effort feed.
    pub fn take_recommendations(&self, user_id: i64, limit: usize) -> Result<Vec<QueueRecord>> {
        let rows = self.store.unserved_for(user_id, limit)?;
        if !rows.is_empty() {
            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            self.store.mark_served(&ids)?;
        }
        Ok(rows)
    }

    /// Exercises due for review, resolved through layered fallbacks:
    /// the unserved queue, then similars of the last failed attempt, then
    /// the weakest topic, then the head of the catalog. Returns an empty
    /// list only when the catalog itself is empty.
    pub fn due_for(&self, user_id: i64, limit: usize) -> Result<Vec<ExerciseInfo>> {
        // 1) Existing queue, best score first.
        let queued = self.store.unserved_for(user_id, limit)?;
        if !queued.is_empty() {
            let mut exercises = Vec::with_capacity(queued.len());
            for record in &queued {
                if let Some(info) = self.store.get_exercise(record.exercise_id)? {
                    exercises.push(info);
                }
            }
            if !exercises.is_empty() {
                return Ok(exercises);
            }
        }

        // 2) Similars of the most recent failure.
        let last_fail = self.store.last_failed_attempt(user_id)?;
        if let Some(fail) = &last_fail {
            let similar = self
                .similar_exercises(
                    fail.exercise_id,
                    limit,
                    DEFAULT_MIN_SIM,
                    DUE_MMR_LAMBDA,
                    None,
                )
                .unwrap_or_else(|e| {
                    warn!("Similarity fallback failed for user {}: {}", user_id, e);
                    Vec::new()
                });
            if !similar.is_empty() {
                return Ok(similar.into_iter().map(|r| r.exercise).collect());
            }
        }

        // 3) The user's weakest topic, constrained to the last failed level
        //    when known.
        if let Some(weak) = self.store.top_weakness(user_id)? {
            let level = match &last_fail {
                Some(fail) => self
                    .store
                    .get_exercise(fail.exercise_id)?
                    .map(|info| info.lesson_level),
                None => None,
            };
            let matches = self
                .store
                .exercises_for_topic(&weak.topic, level.as_deref(), limit)?;
            if !matches.is_empty() {
                return Ok(matches);
            }
        }

        // 4) Global fallback: head of the catalog in canonical order.
        self.store.catalog_page(limit)
    }
}
