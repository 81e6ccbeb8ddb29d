//! Attempt recording and weakness tracking.

use super::RecommendationEngine;
use crate::text::{skill_for, topic_of};
use anyhow::{Result, anyhow};
use lexirec_store::{AttemptInsert, WeaknessRecord};
use tracing::warn;

/// Priority nudge applied on an incorrect answer.
const PRIORITY_NUDGE_WRONG: f64 = 0.5;

/// Priority nudge applied on a correct answer.
const PRIORITY_NUDGE_RIGHT: f64 = -0.1;

#[derive(Debug, Clone)]
pub struct AttemptInput {
    pub user_id: i64,
    pub exercise_id: i64,
    pub is_correct: bool,
    pub score: Option<f64>,
    pub topic: Option<String>,
    pub skill: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub weakness: WeaknessRecord,
    /// Recommendations queued by this attempt (0 on a correct answer or when
    /// generation failed soft).
    pub queued: usize,
}

impl RecommendationEngine {
    /// Record an attempt: append the log row, update the weakness aggregate
    /// and, on an incorrect answer, refresh the recommendation queue.
    ///
    /// The append and the weakness update are load-bearing and fail loudly;
    /// queue generation is best-effort and never surfaces its errors to the
    /// caller.
    pub fn record_attempt(&self, input: AttemptInput) -> Result<AttemptOutcome> {
        let base = self
            .store
            .get_exercise(input.exercise_id)?
            .ok_or_else(|| anyhow!("Exercise {} not found", input.exercise_id))?;

        let derived_topic = topic_of(&base);
        let derived_skill = skill_for(&base.exercise_type);
        let topic = input
            .topic
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| derived_topic.clone());
        let skill = input
            .skill
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| derived_skill.as_str().to_string());

        self.store.insert_attempt(&AttemptInsert {
            user_id: input.user_id,
            exercise_id: input.exercise_id,
            is_correct: input.is_correct,
            score: input.score,
            user_answer: input.answer.clone(),
            topic,
            skill,
        })?;

        // The weakness aggregate is always keyed by the exercise's derived
        // topic/skill, regardless of caller-supplied tags on the log row.
        let mut weakness =
            self.store
                .get_or_create_weakness(input.user_id, &derived_topic, derived_skill.as_str())?;
        weakness.attempts += 1;
        if !input.is_correct {
            weakness.errors += 1;
        }
        weakness.error_rate = weakness.errors as f64 / weakness.attempts as f64;
        let nudge = if input.is_correct {
            PRIORITY_NUDGE_RIGHT
        } else {
            PRIORITY_NUDGE_WRONG
        };
        weakness.priority = (weakness.priority + nudge).clamp(0.0, 1.0);
        self.store.update_weakness(&weakness)?;

        let queued = if input.is_correct {
            0
        } else {
            match self.refresh_queue(
                input.user_id,
                &base,
                weakness.priority,
                input.answer.as_deref(),
            ) {
                Ok(n) => n,
                Err(e) => {
                    warn!(
                        user = input.user_id,
                        exercise = input.exercise_id,
                        "Recommendation refresh failed: {}",
                        e
                    );
                    0
                }
            }
        };

        Ok(AttemptOutcome { weakness, queued })
    }
}
