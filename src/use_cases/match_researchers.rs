use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::match_command::MatchCommand;
use crate::domain::entities::search_hit::RankedMatch;
use crate::domain::services::profile_embedding::{ProfileEmbedder, ProfileEmbeddingError};
use crate::helper::error_chain_fmt;
use crate::ports::embedding_provider::EmbeddingProvider;
use crate::ports::profile_store::{ProfileStore, ProfileStoreError};
use crate::ports::user_document_store::{UserDocumentStore, UserDocumentStoreError};

use super::search_similar_profiles::{
    SearchSimilarProfilesError, SimilarProfilesSearch, TopK,
};

/// The matching entry points: from raw query text or from a previously
/// uploaded user document.
///
/// Each request is an independent, stateless traversal of
/// embed (text path only) -> search -> dedup -> shape. The user path
/// reuses the vector computed at upload time and performs zero new
/// embedding calls, which is what keeps repeat queries free of external
/// API cost.
pub struct MatchResearchersUseCase {
    embedder: ProfileEmbedder,
    search: SimilarProfilesSearch,
    profile_store: Arc<dyn ProfileStore>,
    user_document_store: Arc<dyn UserDocumentStore>,
}

impl MatchResearchersUseCase {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        profile_store: Arc<dyn ProfileStore>,
        user_document_store: Arc<dyn UserDocumentStore>,
    ) -> Self {
        Self {
            embedder: ProfileEmbedder::new(embedding_provider),
            search: SimilarProfilesSearch::new(profile_store.clone()),
            profile_store,
            user_document_store,
        }
    }

    /// Embeds `query_text` and returns the ranked matches.
    #[tracing::instrument(name = "Matching researchers by text", skip(self, query_text))]
    pub async fn match_by_text(
        &self,
        query_text: &str,
        top_k: TopK,
        institution: Option<&str>,
    ) -> Result<Vec<RankedMatch>, MatchError> {
        let query_vector = self
            .embedder
            .embed_and_mean(&[query_text.to_string()], None)
            .await?
            .ok_or(MatchError::EmptyQuery)?;

        self.run_search(&query_vector, top_k, institution).await
    }

    /// Returns the ranked matches for the vector stored at upload time
    /// for `user_id`.
    #[tracing::instrument(name = "Matching researchers by user document", skip(self))]
    pub async fn match_by_user(
        &self,
        user_id: Uuid,
        top_k: TopK,
        institution: Option<&str>,
    ) -> Result<Vec<RankedMatch>, MatchError> {
        let document = self
            .user_document_store
            .get_by_id(user_id)
            .await?
            .ok_or(MatchError::UserNotFound(user_id))?;

        let query_vector = document.embedding.ok_or(MatchError::NoEmbedding(user_id))?;

        self.run_search(&query_vector, top_k, institution).await
    }

    /// Single dispatch boundary for the closed command set.
    #[tracing::instrument(name = "Executing match command", skip(self))]
    pub async fn execute(&self, command: MatchCommand) -> Result<CommandOutcome, MatchError> {
        match command {
            MatchCommand::GetTopMatches {
                query,
                top_k,
                institution,
            } => {
                let top_k = TopK::new(top_k)?;
                let matches = self
                    .match_by_text(&query, top_k, institution.as_deref())
                    .await?;
                Ok(CommandOutcome::Matches(matches))
            }
            MatchCommand::ListInstitutions => {
                let institutions = self.profile_store.list_institutions().await?;
                Ok(CommandOutcome::Institutions(institutions))
            }
        }
    }

    async fn run_search(
        &self,
        query_vector: &[f32],
        top_k: TopK,
        institution: Option<&str>,
    ) -> Result<Vec<RankedMatch>, MatchError> {
        let hits = self.search.search(query_vector, top_k, institution).await?;

        // Duplicate rows can slip into the store through concurrent
        // upserts; the best-ranked occurrence wins
        let mut seen = HashSet::new();
        let matches: Vec<RankedMatch> = hits
            .into_iter()
            .filter(|hit| seen.insert(hit.profile.id))
            .map(RankedMatch::from)
            .collect();

        info!(matches = matches.len(), "Ranked researcher matches");
        Ok(matches)
    }
}

/// Result of a validated `MatchCommand`.
#[derive(Debug, Serialize)]
pub enum CommandOutcome {
    Matches(Vec<RankedMatch>),
    Institutions(Vec<String>),
}

#[derive(thiserror::Error)]
pub enum MatchError {
    #[error("The query text contains no usable content")]
    EmptyQuery,

    #[error("User document {0} not found")]
    UserNotFound(Uuid),

    #[error("User document {0} has no embedding to search with")]
    NoEmbedding(Uuid),

    #[error(transparent)]
    EmbeddingError(#[from] ProfileEmbeddingError),

    #[error(transparent)]
    SearchError(#[from] SearchSimilarProfilesError),

    #[error(transparent)]
    ProfileStoreError(#[from] ProfileStoreError),

    #[error(transparent)]
    UserDocumentStoreError(#[from] UserDocumentStoreError),
}

impl MatchError {
    /// Machine-readable kind for callers that map errors onto a wire
    /// format; the `Display` form stays the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::EmptyQuery => "empty_query",
            MatchError::UserNotFound(_) => "user_not_found",
            MatchError::NoEmbedding(_) => "no_embedding",
            MatchError::EmbeddingError(ProfileEmbeddingError::ProviderError(_)) => {
                "embedding_unavailable"
            }
            MatchError::EmbeddingError(ProfileEmbeddingError::PoolingError(_)) => {
                "degenerate_embedding_input"
            }
            MatchError::SearchError(SearchSimilarProfilesError::InvalidTopK(_)) => "invalid_top_k",
            MatchError::SearchError(SearchSimilarProfilesError::InvalidFilter { .. }) => {
                "invalid_filter"
            }
            MatchError::SearchError(SearchSimilarProfilesError::StoreError(e))
            | MatchError::ProfileStoreError(e) => match e {
                ProfileStoreError::DimensionMismatch { .. } => "dimension_mismatch",
                _ => "store_error",
            },
            MatchError::UserDocumentStoreError(_) => "store_error",
        }
    }
}

impl std::fmt::Debug for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
