//! `SeaORM` entity definitions.
//!
//! Every tenant-scoped table carries a non-null `organization_id`; statuses
//! and enums are stored as text and validated by the `deciframe-core` types.

pub mod audit_logs;
pub mod business_cases;
pub mod delayed_jobs;
pub mod departments;
pub mod epics;
pub mod notification_settings;
pub mod notification_templates;
pub mod notifications;
pub mod organizations;
pub mod problems;
pub mod project_milestones;
pub mod projects;
pub mod report_runs;
pub mod report_templates;
pub mod stories;
pub mod users;
pub mod workflow_library;
pub mod workflow_templates;
