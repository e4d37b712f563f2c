//! Integration test against live infrastructure.
//!
//! This test verifies the complete integration:
//! 1. Database connection and schema
//! 2. Account storage (create/read)
//! 3. News feed CRUD
//! 4. PACS gateway reachability and study listing
//!
//! Note: this requires a running PostgreSQL instance and an
//! Orthanc-compatible PACS configured via environment variables.
//!
//! Run with: cargo test --test integration_test -- --ignored

use pacs_portal::config::AppConfig;
use pacs_portal::db::{self, queries};
use pacs_portal::models::news::NewsDraft;
use pacs_portal::services::pacs::PacsClient;
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires running PostgreSQL and PACS
async fn test_full_integration() {
    // Load config from environment
    let config = AppConfig::from_env().expect("Failed to load config");

    // Initialize database
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    // 1. Account round-trip
    let email = format!("it-{}@example.com", Uuid::new_v4());
    let user = queries::create_user(&db_pool, "integration-user", &email, "$2b$12$fakehash")
        .await
        .expect("Failed to create user");

    assert_eq!(user.email, email);
    assert!(user.is_active);

    let fetched = queries::get_user_by_email(&db_pool, &email)
        .await
        .expect("Failed to query user")
        .expect("User not found");
    assert_eq!(fetched.id, user.id);

    assert!(queries::get_user_by_email(&db_pool, "missing@example.com")
        .await
        .expect("Failed to query user")
        .is_none());

    // 2. News feed CRUD
    let draft = NewsDraft {
        title: "Integration test item".to_string(),
        content: "Created by the integration test".to_string(),
        image: None,
    };
    let item = queries::insert_news(&db_pool, &draft)
        .await
        .expect("Failed to insert news");

    let listed = queries::list_news(&db_pool).await.expect("Failed to list news");
    assert!(listed.iter().any(|n| n.id == item.id));

    let updated = queries::update_news(
        &db_pool,
        item.id,
        &NewsDraft {
            title: "Updated title".to_string(),
            content: draft.content.clone(),
            image: None,
        },
    )
    .await
    .expect("Failed to update news")
    .expect("News item disappeared");
    assert_eq!(updated.title, "Updated title");

    assert!(queries::delete_news(&db_pool, item.id)
        .await
        .expect("Failed to delete news"));
    assert!(queries::get_news(&db_pool, item.id)
        .await
        .expect("Failed to query news")
        .is_none());

    // 3. PACS gateway
    let pacs = PacsClient::new(&config.pacs_url);
    pacs.ping().await.expect("PACS unreachable");

    let studies = pacs.list_studies().await.expect("Failed to list studies");
    for study_id in studies.iter().take(3) {
        let details = pacs
            .study_details(study_id)
            .await
            .expect("Failed to fetch study details");
        assert_eq!(&details.id, study_id);
    }
}
