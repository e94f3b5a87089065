use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::entities::profile::{deterministic_profile_id, Profile};
use crate::domain::services::profile_embedding::{ProfileEmbedder, ProfileEmbeddingError};
use crate::helper::error_chain_fmt;
use crate::ports::embedding_provider::EmbeddingProvider;
use crate::ports::profile_store::{ProfileStore, ProfileStoreError};

/// One row of the scraped researcher CSV. Columns may be missing or
/// empty; the `abstracts` column carries a JSON array of strings when the
/// scraper found publication abstracts.
#[derive(Debug, Deserialize)]
struct ProfileCsvRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    research_area: String,
    #[serde(default)]
    institution: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    profile_url: String,
    #[serde(default)]
    abstracts: String,
    #[serde(default)]
    top_abstract: String,
}

/// Counters reported after an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionSummary {
    pub rows_read: usize,
    pub profiles_upserted: usize,
    /// Rows skipped because no identifying key (url, email or name) was
    /// present
    pub rows_without_key: usize,
    /// Profiles removed by the post-run cleanup of abstract-less rows
    pub profiles_deleted: u64,
}

/// Ingests scraped researcher rows: derives the deterministic profile id,
/// embeds and mean-pools the abstracts, and upserts each profile
/// (last-write-wins). After the batch, profiles left without abstracts
/// are deleted so no row carries a stale or meaningless embedding.
pub struct IngestProfilesUseCase {
    embedder: ProfileEmbedder,
    profile_store: Arc<dyn ProfileStore>,
    max_abstracts_per_profile: usize,
}

impl IngestProfilesUseCase {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        profile_store: Arc<dyn ProfileStore>,
        max_abstracts_per_profile: usize,
    ) -> Self {
        Self {
            embedder: ProfileEmbedder::new(embedding_provider),
            profile_store,
            max_abstracts_per_profile,
        }
    }

    #[tracing::instrument(name = "Ingesting profiles from CSV", skip(self))]
    pub async fn ingest_csv(&self, csv_path: &Path) -> Result<IngestionSummary, IngestProfilesError> {
        let mut reader = csv::Reader::from_path(csv_path)?;
        let rows: Vec<ProfileCsvRow> = reader.deserialize().collect::<Result<_, _>>()?;

        let mut summary = IngestionSummary {
            rows_read: rows.len(),
            profiles_upserted: 0,
            rows_without_key: 0,
            profiles_deleted: 0,
        };

        for row in rows {
            if self.ingest_row(row).await? {
                summary.profiles_upserted += 1;
            } else {
                summary.rows_without_key += 1;
            }
        }

        summary.profiles_deleted = self.profile_store.delete_profiles_without_abstracts().await?;

        info!(?summary, "Finished profile ingestion");
        Ok(summary)
    }

    /// Returns whether the row was ingested (false: skipped for lack of
    /// an identifying key).
    async fn ingest_row(&self, row: ProfileCsvRow) -> Result<bool, IngestProfilesError> {
        let id = match deterministic_profile_id(&row.profile_url, &row.email, &row.name) {
            Some(id) => id,
            None => {
                warn!("Skipping row without any identifying key");
                return Ok(false);
            }
        };

        let raw_abstracts = if row.abstracts.trim().is_empty() {
            &row.top_abstract
        } else {
            &row.abstracts
        };
        let mut abstracts = parse_abstracts(raw_abstracts);
        abstracts.truncate(self.max_abstracts_per_profile);

        let embedding = self.embedder.embed_and_mean(&abstracts, None).await?;

        let now = Utc::now();
        let profile = Profile {
            id,
            name: row.name.trim().to_string(),
            email: blank_to_none(row.email),
            title: blank_to_none(row.title),
            research_area: blank_to_none(row.research_area),
            institution: blank_to_none(row.institution),
            country: blank_to_none(row.country),
            profile_url: row.profile_url.trim().to_string(),
            abstracts,
            embedding,
            created_at: now,
            updated_at: now,
        };

        self.profile_store.upsert_profile(&profile).await?;
        Ok(true)
    }
}

/// Decodes the abstracts column: a JSON array of strings. Anything else
/// (empty cell, scalar, broken JSON, non-string entries) degrades to "no
/// abstracts" instead of failing the whole ingestion run.
fn parse_abstracts(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if !raw.starts_with('[') {
        return vec![];
    }

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        _ => vec![],
    }
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(thiserror::Error)]
pub enum IngestProfilesError {
    #[error("Could not read the researcher CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error(transparent)]
    EmbeddingError(#[from] ProfileEmbeddingError),

    #[error(transparent)]
    StoreError(#[from] ProfileStoreError),
}

impl std::fmt::Debug for IngestProfilesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
