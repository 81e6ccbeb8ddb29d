pub mod codec;
pub mod model;

pub use codec::{CodecError, vector_from_bytes, vector_to_bytes};
pub use model::{EmbeddingConfig, EmbeddingModel, HashEmbeddingModel, create_embedding_model, global_model};

/// Dimension of the default embedding space (MiniLM-compatible).
pub const EMBEDDING_DIM: usize = 384;
