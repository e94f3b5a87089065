use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::entities::user_document::{DocumentKind, UserDocument};
use crate::ports::user_document_store::{UserDocumentStore, UserDocumentStoreError};

/// User document store implemented on Postgres.
pub struct UserDocumentPostgresRepository {
    pool: PgPool,
}

impl UserDocumentPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDocumentStore for UserDocumentPostgresRepository {
    #[tracing::instrument(name = "Upserting user document in database", skip(self, document), fields(document_id = %document.id))]
    async fn upsert_user_document(
        &self,
        document: &UserDocument,
    ) -> Result<(), UserDocumentStoreError> {
        // A re-upload under the same id replaces the previous content and
        // embedding, and stamps updated_at
        sqlx::query(
            r#"
    INSERT INTO user_documents (id, filename, content_type, detected_kind, title, content, embedding, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (id) DO UPDATE SET
      filename = EXCLUDED.filename,
      content_type = EXCLUDED.content_type,
      detected_kind = EXCLUDED.detected_kind,
      title = EXCLUDED.title,
      content = EXCLUDED.content,
      embedding = EXCLUDED.embedding,
      updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(document.id)
        .bind(&document.filename)
        .bind(&document.content_type)
        .bind(document.detected_kind.as_str())
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.embedding.clone().map(Vector::from))
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetching user document by id", skip(self))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserDocument>, UserDocumentStoreError> {
        let row = sqlx::query(
            r#"
    SELECT id, filename, content_type, detected_kind, title, content, embedding, created_at, updated_at
    FROM user_documents
    WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_document(&row)).transpose()
    }
}

fn row_to_document(row: &PgRow) -> Result<UserDocument, UserDocumentStoreError> {
    let embedding: Option<Vector> = row.try_get("embedding")?;
    let kind: String = row.try_get("detected_kind")?;
    let detected_kind = DocumentKind::try_from(kind.as_str())
        .map_err(UserDocumentStoreError::InvalidStoredKind)?;

    Ok(UserDocument {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        content_type: row.try_get("content_type")?,
        detected_kind,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        embedding: embedding.map(|vector| vector.to_vec()),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
