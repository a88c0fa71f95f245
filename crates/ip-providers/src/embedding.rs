//! The embedding service contract (spec §4.1, §6.1): batch text → unit
//! vector, pluggable, with a deterministic mock.

use crate::error::ProviderError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

pub type Vector = Vec<f32>;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Fixed dimensionality per instance.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vector, ProviderError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, ProviderError>;
}

/// Cosine similarity. Zero vectors and length-mismatched vectors return
/// 0 rather than erroring (spec §4.5, §8).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A deterministic mock: equal strings produce equal vectors, unrelated
/// strings produce generally dissimilar ones, by seeding a PRNG from a
/// SHA-256 digest of the input and normalizing the result to unit length
/// (spec §6.1).
pub struct MockEmbeddingService {
    dimension: usize,
}

impl MockEmbeddingService {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vector {
        let digest = Sha256::digest(text.as_bytes());
        let seed = u64::from_le_bytes(digest[0..8].try_into().unwrap());
        let mut state = seed;
        let mut raw: Vector = (0..self.dimension)
            .map(|_| {
                // xorshift64*, enough for deterministic pseudo-random floats
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state % 2000) as f32 - 1000.0) / 1000.0
            })
            .collect();
        let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in raw.iter_mut() {
                *v /= norm;
            }
        }
        raw
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vector, ProviderError> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>, ProviderError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
