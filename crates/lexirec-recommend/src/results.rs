use lexirec_store::ExerciseInfo;
use serde::{Deserialize, Serialize};

/// How far the structural filters were relaxed to produce a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationTier {
    /// Same lesson type and same exercise type.
    TopicAndType,
    /// Same lesson type, any exercise type.
    TopicOnly,
    /// Level and language pair only.
    Unconstrained,
}

impl RelaxationTier {
    /// Tiers in strictness order; retrieval stops at the first non-empty one.
    pub const CASCADE: [RelaxationTier; 3] = [
        RelaxationTier::TopicAndType,
        RelaxationTier::TopicOnly,
        RelaxationTier::Unconstrained,
    ];

    /// (same_topic, same_type) soft-filter flags for this tier.
    pub fn constraints(&self) -> (bool, bool) {
        match self {
            RelaxationTier::TopicAndType => (true, true),
            RelaxationTier::TopicOnly => (true, false),
            RelaxationTier::Unconstrained => (false, false),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelaxationTier::TopicAndType => "topic+type",
            RelaxationTier::TopicOnly => "topic",
            RelaxationTier::Unconstrained => "any",
        }
    }
}

/// A candidate exercise with its similarity to the query vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedExercise {
    pub exercise: ExerciseInfo,
    pub similarity: f32,
}

/// Result of a similarity query, including which relaxation tier produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarResult {
    pub items: Vec<RankedExercise>,
    pub tier: Option<RelaxationTier>,
}

impl SimilarResult {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            tier: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
