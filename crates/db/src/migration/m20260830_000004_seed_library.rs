//! Workflow library catalog seed.
//!
//! The library table is global (not tenant-scoped); organizations clone
//! entries into their own `workflow_templates`. Definitions here must stay
//! valid under the definition validator so clones are editable as-is.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SEED_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(UNSEED_SQL).await?;
        Ok(())
    }
}

const SEED_SQL: &str = r#"
INSERT INTO workflow_library (name, category, description, definition) VALUES
(
    'High-Priority Problem Escalation',
    'Problem Management',
    'Alerts the reporter''s manager as soon as a high-priority problem is reported.',
    '{
        "triggers": ["problem_created"],
        "steps": [
            {
                "action": "notify_manager",
                "conditions": ["problem.priority == \"High\""],
                "message": "A high-priority problem was reported in your team."
            },
            {
                "action": "log_action",
                "conditions": ["problem.priority == \"High\""],
                "message": "High-priority problem escalated to manager."
            }
        ]
    }'::jsonb
),
(
    'Problem Intake to Business Case',
    'Problem Management',
    'Converts an analyzed critical-impact problem into a draft business case and assigns an analyst.',
    '{
        "triggers": ["problem_analyzed"],
        "steps": [
            {
                "action": "create_business_case",
                "conditions": ["problem.impact == \"Critical\""]
            },
            {
                "action": "assign_business_analyst",
                "conditions": ["problem.impact == \"Critical\""]
            }
        ]
    }'::jsonb
),
(
    'Case Approval Fan-Out',
    'Business Cases',
    'Notifies stakeholders when a business case is approved and schedules a post-approval review.',
    '{
        "triggers": ["case_approved"],
        "steps": [
            {
                "action": "notify_stakeholders",
                "message": "Business case approved; project planning can begin."
            },
            {
                "action": "schedule_follow_up",
                "due_days": 30,
                "message": "Post-approval review of the business case."
            }
        ]
    }'::jsonb
),
(
    'Small Case Auto-Approval',
    'Business Cases',
    'Approves submitted cases under the review threshold without a manual verdict.',
    '{
        "triggers": ["case_submitted"],
        "steps": [
            {
                "action": "auto_approve",
                "conditions": ["case.estimated_cost < 5000"]
            },
            {
                "action": "send_notification",
                "conditions": ["case.estimated_cost < 5000"],
                "message": "Your business case was auto-approved under the review threshold."
            }
        ]
    }'::jsonb
),
(
    'Milestone Overdue Escalation',
    'Project Delivery',
    'Escalates overdue milestones to the project manager''s manager.',
    '{
        "triggers": ["milestone_overdue"],
        "steps": [
            {
                "action": "escalate_to_manager",
                "message": "A project milestone is overdue and needs attention."
            },
            {
                "action": "log_action",
                "message": "Overdue milestone escalated."
            }
        ]
    }'::jsonb
);
"#;

const UNSEED_SQL: &str = r"
DELETE FROM workflow_library WHERE name IN (
    'High-Priority Problem Escalation',
    'Problem Intake to Business Case',
    'Case Approval Fan-Out',
    'Small Case Auto-Approval',
    'Milestone Overdue Escalation'
);
";
