//! Integration tests for the report-run lifecycle.
//!
//! Require a migrated database; set `DATABASE_URL` to run, otherwise each
//! test skips.

use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

use deciframe_core::lifecycle::RunStatus;
use deciframe_core::report::{ReportFrequency, TemplateType};
use deciframe_db::repositories::{
    OrganizationRepository, ReportRepository, UpsertReportTemplateInput,
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

async fn create_org(db: &DatabaseConnection) -> i32 {
    OrganizationRepository::new(db.clone())
        .create(
            "Report Test Org",
            &format!("{}.example.com", unique("report")),
            "USD",
            "ISO",
            "UTC",
        )
        .await
        .expect("Failed to create organization")
        .id
}

fn template_input(name: &str) -> UpsertReportTemplateInput {
    UpsertReportTemplateInput {
        name: name.to_string(),
        frequency: ReportFrequency::Daily,
        template_type: TemplateType::DashboardSummary,
        filters: json!({}),
        recipients: json!([]),
        is_active: true,
    }
}

#[tokio::test]
async fn test_run_completes_with_artifact() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = ReportRepository::new(db.clone());

    let template = repo
        .create_template(org, template_input("Daily summary"), None)
        .await
        .expect("Failed to create template");

    let run = repo
        .start_run(org, template.id)
        .await
        .expect("Failed to start run");
    assert_eq!(run.status, RunStatus::Running.as_str());
    assert!(run.completed_at.is_none());

    let closed = repo
        .complete_run(run.id, "reports/report_1_1_20260830_070000.pdf", 2)
        .await
        .expect("Failed to complete run");
    assert_eq!(closed.status, RunStatus::Completed.as_str());
    assert_eq!(closed.emails_sent, 2);
    assert!(closed.completed_at.is_some());
    assert!(closed
        .artifact_path
        .as_deref()
        .is_some_and(|p| p.ends_with(".pdf")));
}

#[tokio::test]
async fn test_failed_run_records_error_and_stays_terminal() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = ReportRepository::new(db.clone());

    let template = repo
        .create_template(org, template_input("Risk report"), None)
        .await
        .expect("Failed to create template");
    let run = repo
        .start_run(org, template.id)
        .await
        .expect("Failed to start run");

    let failed = repo
        .fail_run(run.id, "dataset query timed out")
        .await
        .expect("Failed to fail run");
    assert_eq!(failed.status, RunStatus::Failed.as_str());
    assert_eq!(failed.error_message.as_deref(), Some("dataset query timed out"));

    // A terminal run cannot be closed again.
    assert!(repo.complete_run(run.id, "late.pdf", 0).await.is_err());
}

#[tokio::test]
async fn test_runs_list_newest_first() {
    let Some(db) = test_db().await else { return };
    let org = create_org(&db).await;
    let repo = ReportRepository::new(db.clone());

    let template = repo
        .create_template(org, template_input("Trend report"), None)
        .await
        .expect("Failed to create template");

    let first = repo
        .start_run(org, template.id)
        .await
        .expect("Failed to start run");
    repo.complete_run(first.id, "first.pdf", 0)
        .await
        .expect("Failed to complete run");
    let second = repo
        .start_run(org, template.id)
        .await
        .expect("Failed to start run");

    let runs = repo
        .list_runs(org, template.id, 10)
        .await
        .expect("Failed to list runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second.id);
}
