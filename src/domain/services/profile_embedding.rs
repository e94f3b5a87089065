use std::sync::Arc;

use tracing::debug;

use crate::helper::error_chain_fmt;
use crate::ports::embedding_provider::{EmbeddingProvider, EmbeddingProviderError};

use super::mean_pooling::{mean_pool, MeanPoolingError};

/// Service producing one representative vector for a set of texts:
/// per-text embeddings from the provider, combined by (optionally
/// weighted) mean-pooling.
///
/// This is the write-path composition used for profile abstracts and
/// user document chunks, and the read-path composition for raw text
/// queries.
pub struct ProfileEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl ProfileEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embeds `texts` and mean-pools the resulting vectors.
    ///
    /// Returns `Ok(None)` when no usable (non-empty) text remains: the
    /// caller stores "no embedding" rather than a fabricated vector.
    /// Weights, when given, must align with the non-empty texts.
    #[tracing::instrument(name = "Embedding and mean-pooling texts", skip(self, texts, weights))]
    pub async fn embed_and_mean(
        &self,
        texts: &[String],
        weights: Option<&[f32]>,
    ) -> Result<Option<Vec<f32>>, ProfileEmbeddingError> {
        let vectors = self.provider.embed(texts).await?;
        if vectors.is_empty() {
            debug!("No usable text to embed");
            return Ok(None);
        }

        let pooled = mean_pool(&vectors, weights)?;
        Ok(Some(pooled))
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }
}

#[derive(thiserror::Error)]
pub enum ProfileEmbeddingError {
    #[error(transparent)]
    ProviderError(#[from] EmbeddingProviderError),

    #[error(transparent)]
    PoolingError(#[from] MeanPoolingError),
}

impl std::fmt::Debug for ProfileEmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
