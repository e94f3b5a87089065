use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::profile::Profile;
use crate::ports::profile_store::{ProfileStore, ProfileStoreError};

/// Profile store implemented on Postgres with the pgvector extension.
///
/// Embeddings live in a `vector(N)` column; nearest-neighbor queries use
/// the `<=>` cosine distance operator with `ORDER BY distance LIMIT k`,
/// which agrees with the L2 normalization applied at pooling time.
pub struct ProfilePostgresRepository {
    pool: PgPool,
    /// Expected vector dimension; every vector crossing this boundary is
    /// length-checked before touching the database
    dimension: usize,
}

impl ProfilePostgresRepository {
    pub fn new(pool: PgPool, dimension: usize) -> Self {
        Self { pool, dimension }
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

#[async_trait]
impl ProfileStore for ProfilePostgresRepository {
    #[tracing::instrument(name = "Upserting profile in database", skip(self, profile), fields(profile_id = %profile.id))]
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        if let Some(embedding) = &profile.embedding {
            self.check_dimension(embedding)?;
        }

        // Last-write-wins: a re-ingested profile fully overwrites the
        // previous row, keeping only its created_at
        sqlx::query(
            r#"
    INSERT INTO profiles (id, name, email, title, research_area, institution, country, profile_url, abstracts, embedding, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    ON CONFLICT (id) DO UPDATE SET
      name = EXCLUDED.name,
      email = EXCLUDED.email,
      title = EXCLUDED.title,
      research_area = EXCLUDED.research_area,
      institution = EXCLUDED.institution,
      country = EXCLUDED.country,
      profile_url = EXCLUDED.profile_url,
      abstracts = EXCLUDED.abstracts,
      embedding = EXCLUDED.embedding,
      updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.title)
        .bind(&profile.research_area)
        .bind(&profile.institution)
        .bind(&profile.country)
        .bind(&profile.profile_url)
        .bind(&profile.abstracts)
        .bind(profile.embedding.clone().map(Vector::from))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetching profile by id", skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError> {
        let row = sqlx::query(
            r#"
    SELECT id, name, email, title, research_area, institution, country, profile_url, abstracts, embedding, created_at, updated_at
    FROM profiles
    WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_profile(&row)).transpose()
    }

    #[tracing::instrument(name = "Querying nearest profiles", skip(self, query_vector))]
    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        limit: usize,
        institution: Option<&str>,
    ) -> Result<Vec<(Profile, f32)>, ProfileStoreError> {
        self.check_dimension(query_vector)?;

        // The institution predicate is part of the distance query: a
        // filtered search still fills `limit` rows when enough matching
        // profiles exist. Ties on distance are broken by id so results
        // are stable across runs.
        let rows = sqlx::query(
            r#"
    SELECT id, name, email, title, research_area, institution, country, profile_url, abstracts, embedding, created_at, updated_at,
           (embedding <=> $1) AS distance
    FROM profiles
    WHERE embedding IS NOT NULL
      AND ($2::text IS NULL OR institution = $2)
    ORDER BY embedding <=> $1 ASC, id ASC
    LIMIT $3
            "#,
        )
        .bind(Vector::from(query_vector.to_vec()))
        .bind(institution)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let profile = row_to_profile(row)?;
                let distance: f64 = row.try_get("distance")?;
                Ok((profile, distance as f32))
            })
            .collect()
    }

    #[tracing::instrument(name = "Listing distinct institutions", skip(self))]
    async fn list_institutions(&self) -> Result<Vec<String>, ProfileStoreError> {
        let institutions = sqlx::query_scalar(
            r#"
    SELECT DISTINCT institution
    FROM profiles
    WHERE institution IS NOT NULL AND institution <> ''
    ORDER BY institution
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(institutions)
    }

    #[tracing::instrument(name = "Deleting profiles without abstracts", skip(self))]
    async fn delete_profiles_without_abstracts(&self) -> Result<u64, ProfileStoreError> {
        let result = sqlx::query(
            r#"
    DELETE FROM profiles WHERE abstracts IS NULL OR cardinality(abstracts) = 0
            "#,
        )
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        info!(deleted, "Cleared profiles without abstracts");
        Ok(deleted)
    }
}

fn row_to_profile(row: &PgRow) -> Result<Profile, ProfileStoreError> {
    let embedding: Option<Vector> = row.try_get("embedding")?;

    Ok(Profile {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        title: row.try_get("title")?,
        research_area: row.try_get("research_area")?,
        institution: row.try_get("institution")?,
        country: row.try_get("country")?,
        profile_url: row.try_get("profile_url")?,
        abstracts: row.try_get("abstracts")?,
        embedding: embedding.map(|vector| vector.to_vec()),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
