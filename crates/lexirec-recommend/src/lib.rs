pub mod engine;
pub mod ranking;
pub mod results;
pub mod text;

pub use engine::{AttemptInput, AttemptOutcome, RecommendationEngine};
pub use ranking::{cosine_similarity, mmr_select};
pub use results::{RankedExercise, RelaxationTier, SimilarResult};
pub use text::{Skill, exercise_text, human_reason, skill_for, topic_of};
