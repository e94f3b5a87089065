use std::sync::Arc;

use tracing::info;

use crate::domain::entities::search_hit::SearchHit;
use crate::helper::error_chain_fmt;
use crate::ports::profile_store::{ProfileStore, ProfileStoreError};

/// Hard ceiling on `top_k`, to keep result sets (and the provider calls
/// behind them) small
pub const MAX_TOP_K: usize = 20;

/// A validated result-set size, between 1 and `MAX_TOP_K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopK(usize);

impl TopK {
    pub fn new(value: usize) -> Result<Self, SearchSimilarProfilesError> {
        if value < 1 || value > MAX_TOP_K {
            return Err(SearchSimilarProfilesError::InvalidTopK(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for TopK {
    fn default() -> Self {
        Self(5)
    }
}

/// Nearest-neighbor search over the profile collection.
///
/// Validates the request (top_k bounds, institution filter), issues the
/// distance query with the filter pushed down into it, and converts
/// cosine distance into a similarity score. For a fixed store state and
/// query vector the output is deterministic: distance ascending, ties
/// broken by profile id.
pub struct SimilarProfilesSearch {
    profile_store: Arc<dyn ProfileStore>,
}

impl SimilarProfilesSearch {
    pub fn new(profile_store: Arc<dyn ProfileStore>) -> Self {
        Self { profile_store }
    }

    #[tracing::instrument(name = "Searching similar profiles", skip(self, query_vector))]
    pub async fn search(
        &self,
        query_vector: &[f32],
        top_k: TopK,
        institution: Option<&str>,
    ) -> Result<Vec<SearchHit>, SearchSimilarProfilesError> {
        let institution = match institution {
            Some(raw) => Some(self.resolve_institution(raw).await?),
            None => None,
        };

        let neighbors = self
            .profile_store
            .nearest_neighbors(query_vector, top_k.get(), institution.as_deref())
            .await?;

        info!(hits = neighbors.len(), "Retrieved nearest profiles");

        Ok(neighbors
            .into_iter()
            .map(|(profile, distance)| SearchHit::new(profile, 1.0 - distance))
            .collect())
    }

    /// Canonicalizes an institution filter against the stored distinct
    /// set, case-insensitively. An unknown value is a validation error
    /// carrying the valid options so the caller can self-correct.
    async fn resolve_institution(
        &self,
        raw: &str,
    ) -> Result<String, SearchSimilarProfilesError> {
        let available = self.profile_store.list_institutions().await?;
        let wanted = raw.trim().to_lowercase();

        available
            .iter()
            .find(|institution| institution.to_lowercase() == wanted)
            .cloned()
            .ok_or(SearchSimilarProfilesError::InvalidFilter {
                given: raw.to_string(),
                available,
            })
    }
}

#[derive(thiserror::Error)]
pub enum SearchSimilarProfilesError {
    #[error("top_k must be between 1 and {MAX_TOP_K}, got {0}")]
    InvalidTopK(usize),

    #[error("Institution not found: {given}")]
    InvalidFilter {
        given: String,
        available: Vec<String>,
    },

    #[error(transparent)]
    StoreError(#[from] ProfileStoreError),
}

impl std::fmt::Debug for SearchSimilarProfilesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
