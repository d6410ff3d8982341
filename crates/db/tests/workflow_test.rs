//! Integration tests for the workflow template repository.
//!
//! Require a migrated database; set `DATABASE_URL` to run, otherwise each
//! test skips.

use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

use deciframe_db::repositories::{OrganizationRepository, UpsertWorkflowInput, WorkflowRepository};

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

async fn create_org(db: &DatabaseConnection) -> i32 {
    OrganizationRepository::new(db.clone())
        .create(
            "Workflow Test Org",
            &format!("{}.example.com", unique("wf")),
            "USD",
            "ISO",
            "UTC",
        )
        .await
        .expect("Failed to create organization")
        .id
}

fn definition(triggers: &[&str]) -> serde_json::Value {
    json!({
        "triggers": triggers,
        "steps": [{ "action": "log_action", "message": "matched" }]
    })
}

const KNOWN_ACTIONS: &[&str] = &["log_action"];

#[tokio::test]
async fn test_find_active_matching_filters_by_trigger() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = WorkflowRepository::new(db.clone());

    let on_problem = repo
        .create(
            org,
            UpsertWorkflowInput {
                name: "On problem".to_string(),
                description: None,
                definition: definition(&["problem_created"]),
                is_active: true,
            },
            None,
            KNOWN_ACTIONS,
        )
        .await
        .expect("Failed to create template");

    repo.create(
        org,
        UpsertWorkflowInput {
            name: "On approval".to_string(),
            description: None,
            definition: definition(&["case_approved"]),
            is_active: true,
        },
        None,
        KNOWN_ACTIONS,
    )
    .await
    .expect("Failed to create template");

    let matching = repo
        .find_active_matching(org, "problem_created")
        .await
        .expect("Match query failed");

    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].0.id, on_problem.id);
    assert!(matching[0].1.matches("problem_created"));
}

#[tokio::test]
async fn test_find_active_matching_skips_inactive() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = WorkflowRepository::new(db.clone());

    let template = repo
        .create(
            org,
            UpsertWorkflowInput {
                name: "Dormant".to_string(),
                description: None,
                definition: definition(&["case_submitted"]),
                is_active: false,
            },
            None,
            KNOWN_ACTIONS,
        )
        .await
        .expect("Failed to create template");

    let matching = repo
        .find_active_matching(org, "case_submitted")
        .await
        .expect("Match query failed");
    assert!(matching.is_empty());

    repo.set_active(org, template.id, true)
        .await
        .expect("Failed to activate");
    let matching = repo
        .find_active_matching(org, "case_submitted")
        .await
        .expect("Match query failed");
    assert_eq!(matching.len(), 1);
}

#[tokio::test]
async fn test_matching_is_tenant_scoped() {
    let Some(db) = test_db().await else { return };
    let org_a = create_org(&db).await;
    let org_b = create_org(&db).await;
    let repo = WorkflowRepository::new(db.clone());

    repo.create(
        org_a,
        UpsertWorkflowInput {
            name: "A only".to_string(),
            description: None,
            definition: definition(&["project_created"]),
            is_active: true,
        },
        None,
        KNOWN_ACTIONS,
    )
    .await
    .expect("Failed to create template");

    let matching = repo
        .find_active_matching(org_b, "project_created")
        .await
        .expect("Match query failed");
    assert!(matching.is_empty());
}

#[tokio::test]
async fn test_invalid_definition_rejected_at_save() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = WorkflowRepository::new(db.clone());

    let result = repo
        .create(
            org,
            UpsertWorkflowInput {
                name: "Bad trigger".to_string(),
                description: None,
                definition: definition(&["comet_sighted"]),
                is_active: true,
            },
            None,
            KNOWN_ACTIONS,
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_clone_from_library_starts_inactive() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = WorkflowRepository::new(db.clone());

    let library = repo.list_library().await.expect("Library query failed");
    let Some(entry) = library.first() else {
        eprintln!("library not seeded; skipping");
        return;
    };

    let known = &[
        "notify_manager",
        "send_notification",
        "notify_stakeholders",
        "create_task",
        "escalate_to_manager",
        "auto_approve",
        "schedule_follow_up",
        "create_business_case",
        "assign_business_analyst",
        "log_action",
    ];
    let clone = repo
        .clone_from_library(org, entry.id, None, known)
        .await
        .expect("Clone failed");

    assert_eq!(clone.name, entry.name);
    assert_eq!(clone.organization_id, org);
    assert!(!clone.is_active);
}
