use std::path::PathBuf;

use uuid::Uuid;

use researcher_match_service::domain::entities::profile::deterministic_profile_id;
use researcher_match_service::ports::profile_store::ProfileStore;
use researcher_match_service::use_cases::ingest_profiles::IngestionSummary;
use researcher_match_service::use_cases::search_similar_profiles::TopK;

use crate::helpers::{spawn_app, TestApp};

/// Writes a researcher CSV into a unique temp file and returns its path.
fn write_researchers_csv(rows: &[[&str; 8]]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("researchers_{}.csv", Uuid::new_v4()));

    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer
        .write_record([
            "name",
            "email",
            "title",
            "research_area",
            "institution",
            "country",
            "profile_url",
            "abstracts",
        ])
        .unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.flush().unwrap();

    path
}

async fn ingest(app: &TestApp, rows: &[[&str; 8]]) -> IngestionSummary {
    let path = write_researchers_csv(rows);
    let summary = app.ingest_profiles.ingest_csv(&path).await.unwrap();
    std::fs::remove_file(&path).ok();
    summary
}

#[tokio::test]
async fn ingestion_embeds_and_stores_profiles_with_abstracts() {
    // Arrange
    let app = spawn_app();
    let rows = [[
        "Ada Lovelace",
        "ada@kth.se",
        "Professor",
        "Robotics",
        "KTH",
        "Sweden",
        "https://kth.se/profile/ada",
        r#"["machine learning for robotics"]"#,
    ]];

    // Act
    let summary = ingest(&app, &rows).await;

    // Assert
    assert_eq!(summary.rows_read, 1);
    assert_eq!(summary.profiles_upserted, 1);
    assert_eq!(summary.profiles_deleted, 0);

    let id = deterministic_profile_id("https://kth.se/profile/ada", "", "").unwrap();
    let profile = app.profile_store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(profile.name, "Ada Lovelace");
    assert_eq!(profile.abstracts, vec!["machine learning for robotics"]);

    // The stored vector is the normalized fixture vector for the abstract
    let embedding = profile.embedding.unwrap();
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn re_ingesting_the_same_natural_key_overwrites_in_place() {
    let app = spawn_app();
    let first = [[
        "Ada Lovelace",
        "ada@kth.se",
        "Assistant Professor",
        "Robotics",
        "KTH",
        "Sweden",
        "https://kth.se/profile/ada",
        r#"["machine learning for robotics"]"#,
    ]];
    let second = [[
        "Ada Lovelace",
        "ada.lovelace@kth.se",
        "Professor",
        "Robotics",
        "KTH",
        "Sweden",
        "https://kth.se/profile/ada",
        r#"["deep learning for robotic control"]"#,
    ]];

    ingest(&app, &first).await;
    ingest(&app, &second).await;

    // Exactly one record exists and it reflects the second write
    let matches = app
        .match_researchers
        .match_by_text("robot learning", TopK::new(20).unwrap(), None)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);

    let id = deterministic_profile_id("https://kth.se/profile/ada", "", "").unwrap();
    let profile = app.profile_store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(profile.email.as_deref(), Some("ada.lovelace@kth.se"));
    assert_eq!(profile.title.as_deref(), Some("Professor"));
    assert_eq!(profile.abstracts, vec!["deep learning for robotic control"]);
}

#[tokio::test]
async fn profiles_without_abstracts_are_cleared_after_the_run() {
    let app = spawn_app();
    let rows = [
        [
            "Ada Lovelace",
            "ada@kth.se",
            "Professor",
            "Robotics",
            "KTH",
            "Sweden",
            "https://kth.se/profile/ada",
            r#"["machine learning for robotics"]"#,
        ],
        [
            "Grace Hopper",
            "grace@mit.edu",
            "Professor",
            "Compilers",
            "MIT",
            "USA",
            "https://mit.edu/profile/grace",
            "",
        ],
    ];

    let summary = ingest(&app, &rows).await;

    assert_eq!(summary.profiles_upserted, 2);
    assert_eq!(summary.profiles_deleted, 1);

    let deleted_id = deterministic_profile_id("https://mit.edu/profile/grace", "", "").unwrap();
    assert!(app
        .profile_store
        .get_by_id(deleted_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn rows_without_any_identifying_key_are_skipped() {
    let app = spawn_app();
    let rows = [
        [
            "", "", "Professor", "Robotics", "KTH", "Sweden", "", "",
        ],
        [
            "Ada Lovelace",
            "ada@kth.se",
            "Professor",
            "Robotics",
            "KTH",
            "Sweden",
            "https://kth.se/profile/ada",
            r#"["machine learning for robotics"]"#,
        ],
    ];

    let summary = ingest(&app, &rows).await;

    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.profiles_upserted, 1);
    assert_eq!(summary.rows_without_key, 1);
}

#[tokio::test]
async fn a_profile_with_no_usable_abstracts_gets_no_embedding() {
    let app = spawn_app();
    let rows = [[
        "Grace Hopper",
        "grace@mit.edu",
        "Professor",
        "Compilers",
        "MIT",
        "USA",
        "https://mit.edu/profile/grace",
        r#"["", "   "]"#,
    ]];

    let path = write_researchers_csv(&rows);
    app.ingest_profiles.ingest_csv(&path).await.unwrap();
    std::fs::remove_file(&path).ok();

    // The row was cleaned up (no abstracts survived filtering), and the
    // provider was never called for it
    assert_eq!(app.provider.calls(), 0);
}
