//! Offline embedding provider using hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use ragdoc_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};

/// Function words ignored when hashing (English and Indonesian).
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "yang", "dan", "di", "ke", "dari", "ini", "itu",
    "dengan", "untuk", "pada", "atau", "apa",
];

/// Deterministic embedding provider for local, offline operation.
///
/// Each word contributes to dimensions chosen by hashing its character
/// trigrams and the whole word. Not semantic, but stable and
/// content-dependent, so overlapping vocabulary scores higher.
#[derive(Debug)]
pub struct HashProvider {
    dimensions: usize,
}

impl HashProvider {
    /// Create a new hash provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }

        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();
        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram_hash = window
                    .iter()
                    .collect::<String>()
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));
                let dim = (trigram_hash as usize) % self.dimensions;
                embedding[dim] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % self.dimensions] += *freq as f32;
        }

        // Unit length, so dot product equals cosine
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashProvider {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_embed_single_is_unit_length() {
        let provider = HashProvider::new(384);
        let embedding = provider.embed("hukum pidana").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = HashProvider::new(128);
        let texts = vec!["pidana".to_string(), "perdata".to_string()];

        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], provider.embed("pidana").await.unwrap());
        assert_eq!(batch[1], provider.embed("perdata").await.unwrap());
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = HashProvider::new(384);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = HashProvider::new(384);
        let question = provider.embed("Apa definisi hukum pidana?").await.unwrap();
        let related = provider
            .embed("Hukum pidana adalah kumpulan aturan yang mengatur perbuatan pidana.")
            .await
            .unwrap();
        let unrelated = provider
            .embed("Resep nasi goreng memerlukan bawang merah.")
            .await
            .unwrap();

        assert!(cosine(&question, &related) > cosine(&question, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_error() {
        let provider = HashProvider::new(384);
        assert!(matches!(
            provider.embed("   ").await,
            Err(AppError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let provider = HashProvider::new(384);
        let embedding = provider
            .embed("Gamedex é um aplicativo 🎮 brasileiro para gerenciar jogos!")
            .await
            .unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
