//! Integration tests for full-text search tenancy and caps.
//!
//! Require a migrated database (the tsvector triggers must exist); set
//! `DATABASE_URL` to run, otherwise each test skips.

use sea_orm::{Database, DatabaseConnection};

use deciframe_core::lifecycle::Priority;
use deciframe_core::search::SearchScope;
use deciframe_db::repositories::{
    CreateProblemInput, OrganizationRepository, ProblemRepository, SearchRepository,
    UserRepository,
};

async fn test_db() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    };
    Some(
        Database::connect(&url)
            .await
            .expect("Failed to connect to database"),
    )
}

fn unique(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{tag}{nanos}")
}

/// One org with one reporter, plus a problem carrying a unique search term.
async fn seed_problem(db: &DatabaseConnection, term: &str) -> i32 {
    let org = OrganizationRepository::new(db.clone())
        .create(
            "Search Test Org",
            &format!("{}.example.com", unique("search")),
            "USD",
            "ISO",
            "UTC",
        )
        .await
        .expect("Failed to create organization")
        .id;

    let reporter = UserRepository::new(db.clone())
        .create(
            org,
            &format!("{}@example.com", unique("reporter")),
            "Search Reporter",
            "$argon2id$test_hash",
            deciframe_core::auth::Role::Staff,
            None,
        )
        .await
        .expect("Failed to create user")
        .id;

    ProblemRepository::new(db.clone())
        .create(
            org,
            CreateProblemInput {
                title: format!("Checkout failure {term}"),
                description: format!("Users report {term} during checkout."),
                priority: Priority::High,
                impact: None,
                department_id: None,
                reported_by: reporter,
            },
        )
        .await
        .expect("Failed to create problem");

    org
}

#[tokio::test]
async fn test_search_is_tenant_scoped() {
    let Some(db) = test_db().await else { return };
    let term = unique("glacier");
    let org_a = seed_problem(&db, &term).await;
    let org_b = seed_problem(&db, &unique("meadow")).await;

    let repo = SearchRepository::new(db.clone());
    let hits_a = repo.search(org_a, &term, SearchScope::All, 20).await;
    assert_eq!(hits_a.len(), 1);
    assert_eq!(hits_a[0].entity_type, "problem");
    assert!(hits_a[0].title.contains(&term));

    // The same term finds nothing in the other tenant.
    let hits_b = repo.search(org_b, &term, SearchScope::All, 20).await;
    assert!(hits_b.is_empty());
}

#[tokio::test]
async fn test_search_cap_of_zero_returns_empty() {
    let Some(db) = test_db().await else { return };
    let term = unique("basalt");
    let org = seed_problem(&db, &term).await;

    let repo = SearchRepository::new(db.clone());
    let hits = repo.search(org, &term, SearchScope::All, 0).await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_stats_count_indexed_rows() {
    let Some(db) = test_db().await else { return };
    let org = seed_problem(&db, &unique("quartz")).await;

    let stats = SearchRepository::new(db.clone())
        .stats(org)
        .await
        .expect("Stats query failed");
    // The trigger indexes on insert: every problem row carries a vector.
    assert_eq!(stats.problems.0, 1);
    assert_eq!(stats.problems.1, 1);
    assert_eq!(stats.cases.0, 0);
}
