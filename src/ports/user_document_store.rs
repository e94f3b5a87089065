use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::user_document::UserDocument;
use crate::helper::error_chain_fmt;

/// Port for uploaded user documents (CVs and papers).
#[async_trait]
pub trait UserDocumentStore: Send + Sync {
    /// Inserts or replaces the document stored under its id. Re-uploads
    /// are always last-write-wins and stamp `updated_at`; `created_at`
    /// of an existing row is preserved.
    async fn upsert_user_document(
        &self,
        document: &UserDocument,
    ) -> Result<(), UserDocumentStoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserDocument>, UserDocumentStoreError>;
}

#[derive(thiserror::Error)]
pub enum UserDocumentStoreError {
    #[error("Stored document kind could not be interpreted: {0}")]
    InvalidStoredKind(String),

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl std::fmt::Debug for UserDocumentStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
