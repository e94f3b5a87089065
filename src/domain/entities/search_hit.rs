use serde::Serialize;
use uuid::Uuid;

use super::profile::Profile;

/// Number of abstracts kept on a ranked match, to bound the payload
/// returned to callers
pub const MAX_ABSTRACTS_PER_MATCH: usize = 3;

/// A profile returned by a nearest-neighbor search together with its
/// similarity score.
///
/// Hits are produced fresh for every query and never persisted.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub profile: Profile,
    /// `1 - cosine_distance`: equal to the cosine similarity for
    /// normalized vectors. Not clamped.
    pub score: f32,
}

impl SearchHit {
    pub fn new(profile: Profile, score: f32) -> Self {
        Self { profile, score }
    }
}

/// The presentation shape of a hit: profile attributes with contact
/// metadata, a capped abstract list and the similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub title: Option<String>,
    pub research_area: Option<String>,
    pub institution: Option<String>,
    pub country: Option<String>,
    pub profile_url: String,
    pub abstracts: Vec<String>,
    pub score: f32,
}

impl From<SearchHit> for RankedMatch {
    fn from(hit: SearchHit) -> Self {
        let SearchHit { profile, score } = hit;

        let mut abstracts = profile.abstracts;
        abstracts.truncate(MAX_ABSTRACTS_PER_MATCH);

        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            title: profile.title,
            research_area: profile.research_area,
            institution: profile.institution,
            country: profile.country,
            profile_url: profile.profile_url,
            abstracts,
            score,
        }
    }
}
