use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::profile::Profile;
use crate::ports::profile_store::{ProfileStore, ProfileStoreError};

/// In-memory profile store ranking by brute-force cosine distance.
///
/// The reference implementation of the `ProfileStore` contract: the exact
/// ordering (cosine distance ascending, id tie-break, null embeddings
/// excluded) that the Postgres/pgvector repository delegates to the
/// database. Injected wherever tests need a store without a database.
pub struct ProfileInMemoryRepository {
    dimension: usize,
    rows: RwLock<HashMap<Uuid, Profile>>,
}

impl ProfileInMemoryRepository {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), ProfileStoreError> {
        if vector.len() != self.dimension {
            return Err(ProfileStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// `1 - cosine_similarity`, the same metric as pgvector's `<=>` operator
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    // Guards against a zero norm; a zero vector is "nowhere", maximally
    // distant from everything
    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        return 1.0;
    }

    1.0 - dot / denominator
}

#[async_trait]
impl ProfileStore for ProfileInMemoryRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        if let Some(embedding) = &profile.embedding {
            self.check_dimension(embedding)?;
        }

        let mut rows = self.rows.write().await;
        let mut stored = profile.clone();
        if let Some(previous) = rows.get(&profile.id) {
            // Last-write-wins, but the original creation time survives
            stored.created_at = previous.created_at;
        }
        rows.insert(stored.id, stored);

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        limit: usize,
        institution: Option<&str>,
    ) -> Result<Vec<(Profile, f32)>, ProfileStoreError> {
        self.check_dimension(query_vector)?;

        let rows = self.rows.read().await;
        let mut scored: Vec<(Profile, f32)> = rows
            .values()
            .filter(|profile| match institution {
                Some(institution) => profile.institution.as_deref() == Some(institution),
                None => true,
            })
            .filter_map(|profile| {
                let embedding = profile.embedding.as_ref()?;
                Some((profile.clone(), cosine_distance(query_vector, embedding)))
            })
            .collect();

        scored.sort_by(|(a, da), (b, db)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn list_institutions(&self) -> Result<Vec<String>, ProfileStoreError> {
        let rows = self.rows.read().await;
        let mut institutions: Vec<String> = rows
            .values()
            .filter_map(|profile| profile.institution.clone())
            .filter(|institution| !institution.is_empty())
            .collect();

        institutions.sort();
        institutions.dedup();

        Ok(institutions)
    }

    async fn delete_profiles_without_abstracts(&self) -> Result<u64, ProfileStoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, profile| !profile.abstracts.is_empty());

        Ok((before - rows.len()) as u64)
    }
}
