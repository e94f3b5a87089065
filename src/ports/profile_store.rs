use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::profile::Profile;
use crate::helper::error_chain_fmt;

/// Port for the researcher profile collection.
///
/// Backed by Postgres + pgvector in production and by an in-memory
/// brute-force implementation in tests; both must honor the same
/// ordering contract so search results stay deterministic.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts or fully overwrites the profile stored under its id
    /// (last-write-wins); `created_at` of an existing row is preserved.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ProfileStoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError>;

    /// The `limit` profiles closest to `query_vector` by cosine distance,
    /// ascending, ties broken by id.
    ///
    /// Only profiles with an embedding participate; rows with a null
    /// embedding are excluded, never returned with a placeholder score.
    /// When `institution` is given the predicate is part of the distance
    /// query itself, so a filtered search still fills `limit` results
    /// when enough matching profiles exist.
    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        limit: usize,
        institution: Option<&str>,
    ) -> Result<Vec<(Profile, f32)>, ProfileStoreError>;

    /// Distinct non-empty institution names, sorted
    async fn list_institutions(&self) -> Result<Vec<String>, ProfileStoreError>;

    /// Removes profiles that no longer have any abstracts, so no row
    /// carries a stale embedding. Returns the number of deleted rows.
    async fn delete_profiles_without_abstracts(&self) -> Result<u64, ProfileStoreError>;
}

#[derive(thiserror::Error)]
pub enum ProfileStoreError {
    /// A vector of the wrong dimension reached the store. This is a
    /// configuration bug (mixed embedding models); the query is aborted
    /// rather than comparing garbage.
    #[error("Vector dimension {actual} does not match the store dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl std::fmt::Debug for ProfileStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
