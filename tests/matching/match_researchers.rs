use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use researcher_match_service::domain::entities::match_command::MatchCommand;
use researcher_match_service::domain::entities::profile::Profile;
use researcher_match_service::domain::entities::search_hit::MAX_ABSTRACTS_PER_MATCH;
use researcher_match_service::domain::entities::user_document::{DocumentKind, UserDocument};
use researcher_match_service::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError,
};
use researcher_match_service::ports::profile_store::{ProfileStore, ProfileStoreError};
use researcher_match_service::ports::user_document_store::UserDocumentStore;
use researcher_match_service::repositories::profile_in_memory_repository::ProfileInMemoryRepository;
use researcher_match_service::repositories::user_document_in_memory_repository::UserDocumentInMemoryRepository;
use researcher_match_service::use_cases::match_researchers::{
    CommandOutcome, MatchError, MatchResearchersUseCase,
};
use researcher_match_service::use_cases::search_similar_profiles::{
    SearchSimilarProfilesError, TopK,
};

use crate::helpers::{a_profile, spawn_app, DIMENSION};

fn a_user_document(embedding: Option<Vec<f32>>) -> UserDocument {
    let now = Utc::now();
    UserDocument {
        id: Uuid::new_v4(),
        filename: "cv.pdf".into(),
        content_type: "application/pdf".into(),
        detected_kind: DocumentKind::Cv,
        title: Some("A CV".into()),
        content: "Research experience in robot learning.".into(),
        embedding,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn matching_by_user_reuses_the_stored_vector_without_embedding_calls() {
    // Arrange
    let app = spawn_app();
    let profile = a_profile("Ada", "KTH", Some(vec![0.9, 0.1, 0.0]));
    app.profile_store.upsert_profile(&profile).await.unwrap();

    let document = a_user_document(Some(vec![1.0, 0.1, 0.0]));
    app.user_document_store
        .upsert_user_document(&document)
        .await
        .unwrap();

    // Act
    let matches = app
        .match_researchers
        .match_by_user(document.id, TopK::new(5).unwrap(), None)
        .await
        .unwrap();

    // Assert
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, profile.id);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn matching_by_user_without_an_embedding_fails_with_no_embedding() {
    let app = spawn_app();
    let document = a_user_document(None);
    app.user_document_store
        .upsert_user_document(&document)
        .await
        .unwrap();

    let result = app
        .match_researchers
        .match_by_user(document.id, TopK::new(5).unwrap(), None)
        .await;

    match result {
        Err(MatchError::NoEmbedding(id)) => assert_eq!(id, document.id),
        other => panic!("Expected a NoEmbedding error, got {:?}", other),
    }
}

#[tokio::test]
async fn matching_by_an_unknown_user_fails_with_user_not_found() {
    let app = spawn_app();
    let unknown_id = Uuid::new_v4();

    let result = app
        .match_researchers
        .match_by_user(unknown_id, TopK::new(5).unwrap(), None)
        .await;

    assert!(matches!(result, Err(MatchError::UserNotFound(id)) if id == unknown_id));
}

#[tokio::test]
async fn an_empty_query_is_rejected_without_calling_the_provider() {
    let app = spawn_app();

    let result = app
        .match_researchers
        .match_by_text("   \n", TopK::new(5).unwrap(), None)
        .await;

    assert!(matches!(result, Err(MatchError::EmptyQuery)));
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn an_empty_hit_list_is_a_valid_outcome() {
    let app = spawn_app();

    let matches = app
        .match_researchers
        .match_by_text("robot learning", TopK::new(5).unwrap(), None)
        .await
        .unwrap();

    assert!(matches.is_empty());
}

#[tokio::test]
async fn ranked_matches_cap_their_abstract_lists() {
    let app = spawn_app();
    let mut profile = a_profile("Ada", "KTH", Some(vec![0.9, 0.1, 0.0]));
    profile.abstracts = (0..5).map(|i| format!("abstract {}", i)).collect();
    app.profile_store.upsert_profile(&profile).await.unwrap();

    let matches = app
        .match_researchers
        .match_by_text("robot learning", TopK::new(5).unwrap(), None)
        .await
        .unwrap();

    assert_eq!(matches[0].abstracts.len(), MAX_ABSTRACTS_PER_MATCH);
}

/// Store wrapper returning every neighbor twice, as a stand-in for
/// duplicate rows produced by concurrent upserts.
struct DuplicatingStore {
    inner: Arc<ProfileInMemoryRepository>,
}

#[async_trait]
impl ProfileStore for DuplicatingStore {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        self.inner.upsert_profile(profile).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileStoreError> {
        self.inner.get_by_id(id).await
    }

    async fn nearest_neighbors(
        &self,
        query_vector: &[f32],
        limit: usize,
        institution: Option<&str>,
    ) -> Result<Vec<(Profile, f32)>, ProfileStoreError> {
        let neighbors = self
            .inner
            .nearest_neighbors(query_vector, limit, institution)
            .await?;

        Ok(neighbors
            .into_iter()
            .flat_map(|neighbor| [neighbor.clone(), neighbor])
            .collect())
    }

    async fn list_institutions(&self) -> Result<Vec<String>, ProfileStoreError> {
        self.inner.list_institutions().await
    }

    async fn delete_profiles_without_abstracts(&self) -> Result<u64, ProfileStoreError> {
        self.inner.delete_profiles_without_abstracts().await
    }
}

#[tokio::test]
async fn duplicate_store_rows_are_deduplicated_by_profile_id() {
    let app = spawn_app();
    let profile = a_profile("Ada", "KTH", Some(vec![0.9, 0.1, 0.0]));
    app.profile_store.upsert_profile(&profile).await.unwrap();

    let duplicating_store = Arc::new(DuplicatingStore {
        inner: app.profile_store.clone(),
    });
    let match_researchers = MatchResearchersUseCase::new(
        app.provider.clone(),
        duplicating_store,
        app.user_document_store.clone(),
    );

    let matches = match_researchers
        .match_by_text("robot learning", TopK::new(5).unwrap(), None)
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn the_command_boundary_runs_a_validated_match() {
    let app = spawn_app();
    let profile = a_profile("Ada", "KTH", Some(vec![0.9, 0.1, 0.0]));
    app.profile_store.upsert_profile(&profile).await.unwrap();

    let command = MatchCommand::try_parsing(
        br#"{"name": "get_top_matches", "arguments": {"query": "robot learning", "top_k": 2}}"#,
    )
    .unwrap();

    let outcome = app.match_researchers.execute(command).await.unwrap();

    match outcome {
        CommandOutcome::Matches(matches) => {
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].name, "Ada");
        }
        other => panic!("Expected matches, got {:?}", other),
    }
}

#[tokio::test]
async fn the_command_boundary_rejects_an_out_of_bounds_top_k() {
    let app = spawn_app();

    let command = MatchCommand::try_parsing(
        br#"{"name": "get_top_matches", "arguments": {"query": "robot learning", "top_k": 50}}"#,
    )
    .unwrap();

    let result = app.match_researchers.execute(command).await;

    assert!(matches!(
        result,
        Err(MatchError::SearchError(
            SearchSimilarProfilesError::InvalidTopK(50)
        ))
    ));
}

#[tokio::test]
async fn the_command_boundary_lists_institutions() {
    let app = spawn_app();
    let stores = [
        a_profile("Ada", "KTH", Some(vec![0.9, 0.1, 0.0])),
        a_profile("Grace", "MIT", Some(vec![0.8, 0.2, 0.0])),
    ];
    for profile in &stores {
        app.profile_store.upsert_profile(profile).await.unwrap();
    }

    let command = MatchCommand::try_parsing(br#"{"name": "list_institutions"}"#).unwrap();
    let outcome = app.match_researchers.execute(command).await.unwrap();

    match outcome {
        CommandOutcome::Institutions(institutions) => {
            assert_eq!(institutions, vec!["KTH".to_string(), "MIT".to_string()]);
        }
        other => panic!("Expected institutions, got {:?}", other),
    }
}

/// Provider stand-in for an unreachable embedding service.
struct DownProvider;

#[async_trait]
impl EmbeddingProvider for DownProvider {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingProviderError> {
        Err(EmbeddingProviderError::Unavailable(
            "connection refused".into(),
        ))
    }

    fn model_name(&self) -> &str {
        "down"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

#[tokio::test]
async fn a_provider_outage_surfaces_as_embedding_unavailable() {
    let profile_store = Arc::new(ProfileInMemoryRepository::new(DIMENSION));
    let user_document_store = Arc::new(UserDocumentInMemoryRepository::new());
    let match_researchers =
        MatchResearchersUseCase::new(Arc::new(DownProvider), profile_store, user_document_store);

    let result = match_researchers
        .match_by_text("robot learning", TopK::new(5).unwrap(), None)
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.kind(), "embedding_unavailable");
}
