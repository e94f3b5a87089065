use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::configuration::EmbeddingSettings;
use crate::ports::embedding_provider::{EmbeddingProvider, EmbeddingProviderError};

/// Base delay of the exponential backoff between retries of transient
/// failures
const RETRY_BASE_DELAY_MS: u64 = 200;

/// Client for an OpenAI-compatible `POST {base_url}/embeddings` API.
///
/// Texts are sent in batches of at most `batch_size` entries to bound
/// request size; the provider indexes each returned vector, and the
/// response is re-sorted by that index so out-of-order responses cannot
/// corrupt the input order.
///
/// No local caching: embeddings are recomputed per request, which trades
/// a few provider calls for the absence of staleness bugs.
pub struct OpenAiEmbeddingClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    model_name: String,
    dimension: usize,
    batch_size: usize,
    max_retries: u32,
}

impl OpenAiEmbeddingClient {
    pub fn try_new(settings: &EmbeddingSettings) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model_name: settings.model_name.clone(),
            dimension: settings.dimension,
            batch_size: settings.batch_size,
            max_retries: settings.max_retries,
        })
    }

    /// Embeds one batch, retrying transient failures with exponential
    /// backoff up to `max_retries` additional attempts. Rejected requests
    /// (auth, malformed input) are never retried.
    async fn embed_batch(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        let mut attempt: u32 = 0;
        loop {
            match self.request_embeddings(batch).await {
                Ok(vectors) => return Ok(vectors),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt);
                    warn!(
                        ?error,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient embedding failure, retrying"
                    );
                    sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn request_embeddings(
        &self,
        batch: &[&str],
    ) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingsRequest {
            model: &self.model_name,
            input: batch,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(EmbeddingProviderError::Unavailable(format!(
                "Provider answered {}",
                status
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingProviderError::Rejected(format!(
                "Provider answered {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingProviderError::MalformedResponse(e.to_string()))?;

        let vectors = restore_input_order(parsed.data);
        if vectors.len() != batch.len() {
            return Err(EmbeddingProviderError::MalformedResponse(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(EmbeddingProviderError::MalformedResponse(format!(
                    "Expected {}-dimensional embeddings, got {}",
                    self.dimension,
                    vector.len()
                )));
            }
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    #[tracing::instrument(name = "Requesting embeddings", skip(self, texts))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        let non_empty: Vec<&str> = texts
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .collect();

        if non_empty.is_empty() {
            debug!("All input texts were empty, skipping the provider call");
            return Ok(vec![]);
        }

        let mut vectors = Vec::with_capacity(non_empty.len());
        for batch in non_empty.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// The provider tags every embedding with the index of its input text;
/// sorting on it restores the input order even if the response items
/// arrive shuffled.
fn restore_input_order(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|item| item.index);
    data.into_iter().map(|item| item.embedding).collect()
}
