//! The recommendation engine.
//!
//! Combines the exercise indexer, filtered candidate retrieval, MMR ranking
//! and the per-user weakness/queue state into one interface. The store and
//! the embedding model are injected so tests can run against an in-memory
//! database and the deterministic hashing model.

mod attempts;
mod indexer;
mod queue;
mod similar;

use lexirec_embeddings::{EmbeddingModel, global_model};
use lexirec_store::ContentStore;
use std::sync::Arc;

pub use attempts::{AttemptInput, AttemptOutcome};

/// Default similarity floor for candidate retrieval.
pub const DEFAULT_MIN_SIM: f32 = 0.50;

/// Default relevance/diversity trade-off (diversity-light).
pub const DEFAULT_MMR_LAMBDA: f32 = 0.7;

pub struct RecommendationEngine {
    pub(crate) store: Arc<ContentStore>,
    pub(crate) model: Arc<dyn EmbeddingModel>,
}

impl RecommendationEngine {
    pub fn new(store: Arc<ContentStore>, model: Arc<dyn EmbeddingModel>) -> Self {
        Self { store, model }
    }

    /// Engine backed by the process-wide lazily initialized model.
    pub fn with_default_model(store: Arc<ContentStore>) -> Self {
        Self::new(store, global_model())
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests;
