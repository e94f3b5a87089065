use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::user_document::UserDocument;
use crate::ports::user_document_store::{UserDocumentStore, UserDocumentStoreError};

/// In-memory user document store, the test substitute for the Postgres
/// repository.
pub struct UserDocumentInMemoryRepository {
    rows: RwLock<HashMap<Uuid, UserDocument>>,
}

impl UserDocumentInMemoryRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for UserDocumentInMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDocumentStore for UserDocumentInMemoryRepository {
    async fn upsert_user_document(
        &self,
        document: &UserDocument,
    ) -> Result<(), UserDocumentStoreError> {
        let mut rows = self.rows.write().await;
        let mut stored = document.clone();
        if let Some(previous) = rows.get(&document.id) {
            // Re-uploads replace everything but the creation time
            stored.created_at = previous.created_at;
        }
        rows.insert(stored.id, stored);

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserDocument>, UserDocumentStoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }
}
