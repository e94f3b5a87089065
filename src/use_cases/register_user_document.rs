use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::user_document::{DocumentKind, UserDocument};
use crate::domain::services::profile_embedding::{ProfileEmbedder, ProfileEmbeddingError};
use crate::domain::services::text_chunking::{
    chunk_text, normalize_whitespace, DEFAULT_MAX_CHUNK_CHARS,
};
use crate::helper::error_chain_fmt;
use crate::ports::embedding_provider::EmbeddingProvider;
use crate::ports::user_document_store::{UserDocumentStore, UserDocumentStoreError};

/// An uploaded document after (external) parsing: plain text plus the
/// upload metadata the classifier and the store need.
#[derive(Debug)]
pub struct RegisterUserDocumentRequest {
    /// Opaque handle generated at upload time; re-using it replaces the
    /// previously registered document
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub page_count: usize,
    pub title: Option<String>,
    pub content: String,
}

/// Registers an uploaded CV or paper: classifies it, chunks and embeds
/// its text, and upserts the document (last-write-wins on the id).
///
/// A document whose parser produced no usable text is stored without an
/// embedding; that is a valid state, surfaced later as `NoEmbedding`
/// when the user tries to match with it.
pub struct RegisterUserDocumentUseCase {
    embedder: ProfileEmbedder,
    user_document_store: Arc<dyn UserDocumentStore>,
}

impl RegisterUserDocumentUseCase {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        user_document_store: Arc<dyn UserDocumentStore>,
    ) -> Self {
        Self {
            embedder: ProfileEmbedder::new(embedding_provider),
            user_document_store,
        }
    }

    #[tracing::instrument(
        name = "Registering user document",
        skip(self, request),
        fields(document_id = %request.id)
    )]
    pub async fn execute(
        &self,
        request: RegisterUserDocumentRequest,
    ) -> Result<UserDocument, RegisterUserDocumentError> {
        let detected_kind = DocumentKind::from_page_count(request.page_count);
        info!(kind = detected_kind.as_str(), "Classified uploaded document");

        let normalized = normalize_whitespace(&request.content);
        let chunks = chunk_text(&normalized, DEFAULT_MAX_CHUNK_CHARS);
        let embedding = self.embedder.embed_and_mean(&chunks, None).await?;

        let now = Utc::now();
        let document = UserDocument {
            id: request.id,
            filename: request.filename,
            content_type: request.content_type,
            detected_kind,
            title: request.title,
            content: normalized,
            embedding,
            created_at: now,
            updated_at: now,
        };

        self.user_document_store
            .upsert_user_document(&document)
            .await?;

        Ok(document)
    }
}

#[derive(thiserror::Error)]
pub enum RegisterUserDocumentError {
    #[error(transparent)]
    EmbeddingError(#[from] ProfileEmbeddingError),

    #[error(transparent)]
    StoreError(#[from] UserDocumentStoreError),
}

impl std::fmt::Debug for RegisterUserDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
