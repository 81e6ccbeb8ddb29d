use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
#[cfg(feature = "onnx")]
use std::path::Path;
#[cfg(feature = "onnx")]
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_path: String,
    pub tokenizer_path: String,
    pub max_length: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: "models/minilm.onnx".to_string(),
            tokenizer_path: "models/tokenizer.json".to_string(),
            max_length: 512,
            batch_size: 32,
        }
    }
}

/// Trait for embedding models.
///
/// Implementations return L2-normalized vectors of a fixed dimension.
pub trait EmbeddingModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn dimension(&self) -> usize;
}

/// Deterministic feature-hashing model used when no ONNX model is available.
///
/// Lowercased alphanumeric tokens are hashed into `dimension` signed buckets
/// and the result is L2-normalized. Texts sharing tokens get positive cosine
/// similarity, identical texts map to identical vectors. A text with no
/// tokens yields the zero vector.
pub struct HashEmbeddingModel {
    dimension: usize,
}

impl HashEmbeddingModel {
    pub fn new() -> Self {
        Self {
            dimension: crate::EMBEDDING_DIM,
        }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket_of(token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let h = hasher.finish();
        let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
        ((h >> 1) as usize, sign)
    }
}

impl Default for HashEmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for HashEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vec = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let lowered = token.to_lowercase();
            let (bucket, sign) = Self::bucket_of(&lowered);
            vec[bucket % self.dimension] += sign;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }

        Ok(vec)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(feature = "onnx")]
pub mod onnx {
    use super::*;
    use ndarray::{Array2, Axis};
    use ort::{GraphOptimizationLevel, Session};
    use tokenizers::Tokenizer;

    pub struct OnnxEmbeddingModel {
        session: Session,
        tokenizer: Tokenizer,
        config: EmbeddingConfig,
    }

    impl OnnxEmbeddingModel {
        pub fn load(config: EmbeddingConfig) -> Result<Self> {
            info!("Loading ONNX model from {}", config.model_path);

            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(4)?
                .commit_from_file(&config.model_path)?;

            let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
                .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

            Ok(Self {
                session,
                tokenizer,
                config,
            })
        }

        fn tokenize(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>)> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&x| x as i64)
                .collect();

            let max_len = self.config.max_length;
            let input_ids = if input_ids.len() > max_len {
                input_ids[..max_len].to_vec()
            } else {
                input_ids
            };
            let attention_mask = if attention_mask.len() > max_len {
                attention_mask[..max_len].to_vec()
            } else {
                attention_mask
            };

            Ok((input_ids, attention_mask))
        }

        fn mean_pooling(&self, token_embeddings: &Array2<f32>, attention_mask: &[i64]) -> Vec<f32> {
            let seq_len = token_embeddings.shape()[0];
            let hidden_size = token_embeddings.shape()[1];

            let mut sum = vec![0.0f32; hidden_size];
            let mut count = 0.0f32;

            for i in 0..seq_len {
                if i < attention_mask.len() && attention_mask[i] == 1 {
                    for j in 0..hidden_size {
                        sum[j] += token_embeddings[[i, j]];
                    }
                    count += 1.0;
                }
            }

            if count > 0.0 {
                for v in &mut sum {
                    *v /= count;
                }
            }

            // L2 normalize
            let norm: f32 = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut sum {
                    *v /= norm;
                }
            }

            sum
        }
    }

    impl EmbeddingModel for OnnxEmbeddingModel {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let (input_ids, attention_mask) = self.tokenize(text)?;
            let seq_len = input_ids.len();

            let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids.clone())?;
            let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.clone())?;

            let outputs = self.session.run(ort::inputs![
                "input_ids" => input_ids_array,
                "attention_mask" => attention_mask_array,
            ]?)?;

            let embeddings = outputs[0].try_extract_tensor::<f32>()?;
            let embeddings = embeddings.view();

            let token_embeddings = embeddings.index_axis(Axis(0), 0);
            let token_embeddings = token_embeddings.to_owned();

            Ok(self.mean_pooling(&token_embeddings, &attention_mask))
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            texts.iter().map(|text| self.embed(text)).collect()
        }

        fn dimension(&self) -> usize {
            crate::EMBEDDING_DIM
        }
    }
}

/// Create an embedding model based on available features.
///
/// Falls back to the deterministic hashing model when ONNX is not compiled in
/// or the model file is missing.
pub fn create_embedding_model(
    #[allow(unused_variables)] config: Option<EmbeddingConfig>,
) -> Result<Arc<dyn EmbeddingModel>> {
    #[cfg(feature = "onnx")]
    {
        let config = config.unwrap_or_default();
        if Path::new(&config.model_path).exists() {
            info!("Using ONNX embedding model");
            return Ok(Arc::new(onnx::OnnxEmbeddingModel::load(config)?));
        }
    }

    Ok(Arc::new(HashEmbeddingModel::new()))
}

static GLOBAL_MODEL: OnceLock<Arc<dyn EmbeddingModel>> = OnceLock::new();

/// Process-wide shared model, initialized exactly once on first use.
///
/// Concurrent first callers block on the `OnceLock` until initialization
/// completes, so the underlying model is never loaded twice.
pub fn global_model() -> Arc<dyn EmbeddingModel> {
    GLOBAL_MODEL
        .get_or_init(|| {
            create_embedding_model(None).unwrap_or_else(|e| {
                tracing::warn!("Falling back to hashing model: {}", e);
                Arc::new(HashEmbeddingModel::new())
            })
        })
        .clone()
}
