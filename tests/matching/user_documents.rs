use fake::faker::lorem::en::Sentences;
use fake::Fake;
use uuid::Uuid;

use researcher_match_service::domain::entities::user_document::DocumentKind;
use researcher_match_service::ports::user_document_store::UserDocumentStore;
use researcher_match_service::use_cases::register_user_document::RegisterUserDocumentRequest;

use crate::helpers::spawn_app;

fn an_upload(id: Uuid, page_count: usize, content: &str) -> RegisterUserDocumentRequest {
    RegisterUserDocumentRequest {
        id,
        filename: "upload.pdf".into(),
        content_type: "application/pdf".into(),
        page_count,
        title: Some("My research".into()),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn a_short_upload_is_classified_as_a_cv_and_embedded() {
    // Arrange
    let app = spawn_app();
    let id = Uuid::new_v4();
    let content = Sentences(3..6).fake::<Vec<String>>().join(" ");

    // Act
    let document = app
        .register_user_document
        .execute(an_upload(id, 2, &content))
        .await
        .unwrap();

    // Assert
    assert_eq!(document.detected_kind, DocumentKind::Cv);
    assert!(document.embedding.is_some());
    assert_eq!(app.provider.calls(), 1);

    let stored = app
        .user_document_store
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.embedding, document.embedding);
}

#[tokio::test]
async fn a_long_upload_is_classified_as_a_paper() {
    let app = spawn_app();

    let document = app
        .register_user_document
        .execute(an_upload(Uuid::new_v4(), 9, "An abstract about robot learning."))
        .await
        .unwrap();

    assert_eq!(document.detected_kind, DocumentKind::Paper);
}

#[tokio::test]
async fn an_upload_without_usable_text_is_stored_without_an_embedding() {
    let app = spawn_app();
    let id = Uuid::new_v4();

    let document = app
        .register_user_document
        .execute(an_upload(id, 2, "   \n\t  "))
        .await
        .unwrap();

    assert!(document.embedding.is_none());
    assert_eq!(app.provider.calls(), 0);

    let stored = app
        .user_document_store
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.embedding.is_none());
}

#[tokio::test]
async fn re_uploading_under_the_same_id_replaces_the_previous_document() {
    let app = spawn_app();
    let id = Uuid::new_v4();

    let first = app
        .register_user_document
        .execute(an_upload(id, 2, "organic chemistry synthesis"))
        .await
        .unwrap();
    let second = app
        .register_user_document
        .execute(an_upload(id, 8, "machine learning for robotics"))
        .await
        .unwrap();

    let stored = app
        .user_document_store
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap();

    // Exactly the second write survives, on the original row
    assert_eq!(stored.content, "machine learning for robotics");
    assert_eq!(stored.detected_kind, DocumentKind::Paper);
    assert_eq!(stored.embedding, second.embedding);
    assert_ne!(stored.embedding, first.embedding);
    assert_eq!(stored.created_at, first.created_at);
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn document_content_is_whitespace_normalized_before_storage() {
    let app = spawn_app();
    let id = Uuid::new_v4();

    app.register_user_document
        .execute(an_upload(id, 2, "A  CV\nwith   hard\n\nline breaks"))
        .await
        .unwrap();

    let stored = app
        .user_document_store
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "A CV with hard line breaks");
}
