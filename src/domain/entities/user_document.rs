use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Documents with at most this many pages are treated as CVs; longer
/// uploads are assumed to be publications. The threshold is a property of
/// the classifier, not of the matching core, so it can be tuned without
/// touching the pipeline.
const MAX_CV_PAGES: usize = 3;

/// Classification of an uploaded document, decided by a page-count
/// heuristic upstream of the embedding pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Cv,
    Paper,
}

impl DocumentKind {
    /// Classifies an uploaded document from its page count.
    ///
    /// CVs are short documents; anything longer than a few pages is
    /// assumed to be a publication.
    pub fn from_page_count(page_count: usize) -> Self {
        if page_count <= MAX_CV_PAGES {
            DocumentKind::Cv
        } else {
            DocumentKind::Paper
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cv",
            DocumentKind::Paper => "paper",
        }
    }
}

impl TryFrom<&str> for DocumentKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "cv" => Ok(DocumentKind::Cv),
            "paper" => Ok(DocumentKind::Paper),
            other => Err(format!(
                "{} is not a supported document kind. Use either `cv` or `paper`.",
                other
            )),
        }
    }
}

/// An uploaded CV or paper from a query-submitting user.
///
/// The id is generated once per uploaded document and acts as an opaque
/// session handle. Re-uploading under the same id replaces the previous
/// content and embedding (last-write-wins) and stamps `updated_at`.
/// User documents are never deleted by this service.
#[derive(Debug, Clone)]
pub struct UserDocument {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub detected_kind: DocumentKind,
    pub title: Option<String>,
    /// Plain text extracted from the document by the (external) parser
    pub content: String,
    /// Mean-pooled embedding of the content chunks, absent when the
    /// parser produced no usable text
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
