use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A researcher profile as produced by the scraping/ingestion pipeline.
///
/// The id is a deterministic hash of the profile's natural key so that
/// re-ingesting the same researcher always targets the same row: upserts
/// are last-write-wins on that id.
///
/// Invariant: a profile without abstracts must not carry an embedding.
/// Embeddings are only meaningful when derived from non-empty source text,
/// and the ingestion pipeline deletes abstract-less rows after each run.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub title: Option<String>,
    pub research_area: Option<String>,
    pub institution: Option<String>,
    pub country: Option<String>,
    pub profile_url: String,
    /// Recent publication abstracts, most relevant first (0 to 5 entries)
    pub abstracts: Vec<String>,
    /// Mean-pooled embedding of the abstracts, absent when there was
    /// nothing to embed
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derives the stable profile id from the natural key.
///
/// The canonical profile URL identifies a researcher; rows scraped without
/// one fall back to the email, then to the name. Returns `None` when no
/// identifying key is available at all (such rows cannot be ingested
/// idempotently and are skipped upstream).
pub fn deterministic_profile_id(
    profile_url: &str,
    email: &str,
    name: &str,
) -> Option<Uuid> {
    let natural_key = [profile_url, email, name]
        .into_iter()
        .map(str::trim)
        .find(|key| !key.is_empty())?;

    Some(Uuid::new_v5(&Uuid::NAMESPACE_URL, natural_key.as_bytes()))
}
