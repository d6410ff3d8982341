//! Integration tests for notification dispatch.
//!
//! Cover the event-to-inbox path end to end against a real database.
//! Require a migrated database; set `DATABASE_URL` to run, otherwise each
//! test skips.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

use deciframe_core::auth::Role;
use deciframe_core::notify::Frequency;
use deciframe_db::repositories::{
    DelayedJobRepository, NotificationRepository, OrganizationRepository, ProjectRepository,
    SettingUpdate, UserRepository,
};
use deciframe_engine::{DispatchError, DispatchOutcome, Mailer, NotificationDispatcher};

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

/// Captures outbound mail instead of sending it.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), String> {
        self.sent
            .lock()
            .expect("mailer lock")
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }

    async fn send_with_attachment(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        _attachment_path: &std::path::Path,
        _attachment_name: &str,
    ) -> Result<(), String> {
        self.send(to, subject, html_body).await
    }
}

async fn seed_recipient(db: &DatabaseConnection) -> (i32, i32, String) {
    let org = OrganizationRepository::new(db.clone())
        .create(
            "Dispatch Test Org",
            &format!("{}.example.com", unique("dispatch")),
            "USD",
            "ISO",
            "UTC",
        )
        .await
        .expect("Failed to create organization")
        .id;
    let email = format!("{}@example.com", unique("recipient"));
    let user = UserRepository::new(db.clone())
        .create(org, &email, "Recipient", "$argon2id$test_hash", Role::Staff, None)
        .await
        .expect("Failed to create user");
    (org, user.id, email)
}

fn dispatcher(
    db: &DatabaseConnection,
    mailer: Option<Arc<dyn Mailer>>,
) -> NotificationDispatcher {
    NotificationDispatcher::new(
        NotificationRepository::new(db.clone()),
        UserRepository::new(db.clone()),
        ProjectRepository::new(db.clone()),
        DelayedJobRepository::new(db.clone()),
        mailer,
        1,
    )
}

fn setting(in_app: bool, email: bool) -> SettingUpdate {
    SettingUpdate {
        frequency: Frequency::Immediate,
        threshold_hours: None,
        channel_email: email,
        channel_in_app: in_app,
        channel_push: false,
    }
}

#[tokio::test]
async fn test_event_reaches_recipient_inbox() {
    let Some(db) = test_db().await else { return };
    let (org, user_id, _) = seed_recipient(&db).await;
    let notifications = NotificationRepository::new(db.clone());
    notifications
        .upsert_setting(org, "problem_created", setting(true, false))
        .await
        .expect("Failed to upsert setting");

    let outcome = dispatcher(&db, None)
        .dispatch(
            org,
            "problem_created",
            user_id,
            &json!({"problem": {"id": 1, "title": "Checkout down"}}),
            false,
        )
        .await
        .expect("Dispatch failed");

    let DispatchOutcome::Delivered {
        notification_id: Some(id),
        email_sent,
    } = outcome
    else {
        panic!("expected an inbox delivery, got {outcome:?}");
    };
    assert!(!email_sent);

    let row = notifications
        .find_by_id(id)
        .await
        .expect("Lookup failed")
        .expect("Notification row should exist");
    assert_eq!(row.event_type.as_deref(), Some("problem_created"));
    assert!(!row.is_read);
    assert_eq!(
        notifications
            .unread_count(org, user_id)
            .await
            .expect("Count failed"),
        1
    );
}

#[tokio::test]
async fn test_email_only_setting_writes_no_inbox_row() {
    let Some(db) = test_db().await else { return };
    let (org, user_id, email) = seed_recipient(&db).await;
    let notifications = NotificationRepository::new(db.clone());
    notifications
        .upsert_setting(org, "case_approved", setting(false, true))
        .await
        .expect("Failed to upsert setting");

    let mailer = Arc::new(RecordingMailer::default());
    let outcome = dispatcher(&db, Some(mailer.clone()))
        .dispatch(
            org,
            "case_approved",
            user_id,
            &json!({"case": {"id": 4, "title": "Self-serve refunds"}}),
            false,
        )
        .await
        .expect("Dispatch failed");

    assert_eq!(
        outcome,
        DispatchOutcome::Delivered {
            notification_id: None,
            email_sent: true,
        }
    );
    // The recipient's inbox stays empty; only the email went out.
    assert_eq!(
        notifications
            .unread_count(org, user_id)
            .await
            .expect("Count failed"),
        0
    );
    let sent = mailer.sent.lock().expect("mailer lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, email);
}

#[tokio::test]
async fn test_missing_setting_mutes_event() {
    let Some(db) = test_db().await else { return };
    let (org, user_id, _) = seed_recipient(&db).await;

    let outcome = dispatcher(&db, None)
        .dispatch(org, "it_incident", user_id, &json!({}), false)
        .await
        .expect("Dispatch failed");
    assert_eq!(outcome, DispatchOutcome::Muted);
}

#[tokio::test]
async fn test_unknown_recipient_is_reported() {
    let Some(db) = test_db().await else { return };
    let (org, _, _) = seed_recipient(&db).await;
    NotificationRepository::new(db.clone())
        .upsert_setting(org, "problem_created", setting(true, false))
        .await
        .expect("Failed to upsert setting");

    let result = dispatcher(&db, None)
        .dispatch(org, "problem_created", 0, &json!({}), false)
        .await;
    assert!(matches!(
        result,
        Err(DispatchError::RecipientNotFound(0))
    ));
}
