use async_trait::async_trait;

use crate::helper::error_chain_fmt;

/// Port for remote text-embedding providers.
///
/// Implementations are injected where embeddings are needed so the
/// pipeline can run against a substitute in tests.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts, one vector per non-empty input, in input
    /// order.
    ///
    /// Empty and whitespace-only texts are filtered out before calling
    /// the remote service; when nothing usable remains the result is an
    /// empty vector and no network call is made.
    ///
    /// Implementations must never substitute a zero vector for a failed
    /// call: a zero vector has no well-defined cosine similarity and
    /// would corrupt ranking downstream.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError>;

    /// Identifier of the embedding model in use
    fn model_name(&self) -> &str;

    /// Dimension of the vectors this provider produces
    fn dimension(&self) -> usize;
}

#[derive(thiserror::Error)]
pub enum EmbeddingProviderError {
    /// Transport failure, timeout or a 5xx/429 from the provider. Worth
    /// retrying later.
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the request (auth, malformed input). Not
    /// retriable.
    #[error("Embedding request rejected: {0}")]
    Rejected(String),

    #[error("Embedding response could not be interpreted: {0}")]
    MalformedResponse(String),
}

impl EmbeddingProviderError {
    /// Whether a retry with backoff makes sense for this failure
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingProviderError::Unavailable(_))
    }
}

impl std::fmt::Debug for EmbeddingProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
