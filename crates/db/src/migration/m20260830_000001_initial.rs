//! Initial database migration.
//!
//! Creates all core tables with tenant columns, check constraints, and
//! foreign-key indexes. Search vectors and RLS policies follow in later
//! migrations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANT ROOT
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;
        db.execute_unprepared(DEPARTMENTS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 2: DECISION ENTITIES
        // ============================================================
        db.execute_unprepared(PROBLEMS_SQL).await?;
        db.execute_unprepared(BUSINESS_CASES_SQL).await?;
        db.execute_unprepared(EPICS_SQL).await?;
        db.execute_unprepared(STORIES_SQL).await?;
        db.execute_unprepared(PROJECTS_SQL).await?;
        db.execute_unprepared(PROJECT_MILESTONES_SQL).await?;

        // ============================================================
        // PART 3: NOTIFICATIONS
        // ============================================================
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;
        db.execute_unprepared(NOTIFICATION_SETTINGS_SQL).await?;
        db.execute_unprepared(NOTIFICATION_TEMPLATES_SQL).await?;

        // ============================================================
        // PART 4: WORKFLOWS
        // ============================================================
        db.execute_unprepared(WORKFLOW_TEMPLATES_SQL).await?;
        db.execute_unprepared(WORKFLOW_LIBRARY_SQL).await?;

        // ============================================================
        // PART 5: REPORTS
        // ============================================================
        db.execute_unprepared(REPORT_TEMPLATES_SQL).await?;
        db.execute_unprepared(REPORT_RUNS_SQL).await?;

        // ============================================================
        // PART 6: OPERATIONS
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;
        db.execute_unprepared(DELAYED_JOBS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    domain VARCHAR(255) NOT NULL UNIQUE,
    currency CHAR(3) NOT NULL DEFAULT 'USD',
    date_format VARCHAR(10) NOT NULL DEFAULT 'ISO'
        CHECK (date_format IN ('US', 'EU', 'ISO', 'Long')),
    timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
    default_theme VARCHAR(10) NOT NULL DEFAULT 'light',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const DEPARTMENTS_SQL: &str = r"
CREATE TABLE departments (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    parent_id INTEGER REFERENCES departments(id) ON DELETE RESTRICT,
    level INTEGER NOT NULL DEFAULT 1 CHECK (level BETWEEN 1 AND 5),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_departments_organization ON departments(organization_id);
CREATE INDEX idx_departments_parent ON departments(parent_id);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL,
    name VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'Staff'
        CHECK (role IN ('Staff', 'Manager', 'BA', 'Director', 'CEO', 'PM', 'Admin')),
    department_id INTEGER REFERENCES departments(id) ON DELETE RESTRICT,
    department_status VARCHAR(10) NOT NULL DEFAULT 'pending'
        CHECK (department_status IN ('assigned', 'pending')),
    theme VARCHAR(10),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (organization_id, email)
);

CREATE INDEX idx_users_organization ON users(organization_id);
CREATE INDEX idx_users_department ON users(department_id);
";

const PROBLEMS_SQL: &str = r"
CREATE TABLE problems (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    description TEXT NOT NULL,
    priority VARCHAR(10) NOT NULL DEFAULT 'Medium'
        CHECK (priority IN ('Low', 'Medium', 'High')),
    status VARCHAR(20) NOT NULL DEFAULT 'Open'
        CHECK (status IN ('Open', 'InProgress', 'Submitted', 'Approved', 'Resolved', 'OnHold')),
    impact VARCHAR(20),
    department_id INTEGER REFERENCES departments(id) ON DELETE RESTRICT,
    reported_by INTEGER NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_problems_organization ON problems(organization_id);
CREATE INDEX idx_problems_department ON problems(department_id);
CREATE INDEX idx_problems_status ON problems(organization_id, status);
";

const BUSINESS_CASES_SQL: &str = r"
CREATE TABLE business_cases (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    summary TEXT,
    initiative_name VARCHAR(255),
    problem_id INTEGER REFERENCES problems(id) ON DELETE SET NULL,
    case_type VARCHAR(10) NOT NULL DEFAULT 'Reactive'
        CHECK (case_type IN ('Reactive', 'Proactive', 'Hybrid')),
    case_depth VARCHAR(10) NOT NULL DEFAULT 'Light'
        CHECK (case_depth IN ('Light', 'Full')),
    status VARCHAR(20) NOT NULL DEFAULT 'Open'
        CHECK (status IN ('Open', 'InProgress', 'Submitted', 'Approved', 'Resolved', 'OnHold')),
    cost_estimate NUMERIC(14, 2),
    benefit_estimate NUMERIC(14, 2),
    roi NUMERIC(8, 2),
    risk_level VARCHAR(10),
    assigned_ba INTEGER REFERENCES users(id),
    approved_by INTEGER REFERENCES users(id),
    created_by INTEGER NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_business_cases_organization ON business_cases(organization_id);
CREATE INDEX idx_business_cases_problem ON business_cases(problem_id);
CREATE INDEX idx_business_cases_status ON business_cases(organization_id, status);
";

const EPICS_SQL: &str = r"
CREATE TABLE epics (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    case_id INTEGER NOT NULL REFERENCES business_cases(id) ON DELETE CASCADE,
    project_id INTEGER,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'Draft'
        CHECK (status IN ('Draft', 'Submitted', 'Approved', 'Rejected', 'ChangesRequested')),
    created_by INTEGER NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_epics_organization ON epics(organization_id);
CREATE INDEX idx_epics_case ON epics(case_id);
CREATE INDEX idx_epics_project ON epics(project_id);
";

const STORIES_SQL: &str = r"
CREATE TABLE stories (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    epic_id INTEGER NOT NULL REFERENCES epics(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    priority VARCHAR(10) NOT NULL DEFAULT 'Medium'
        CHECK (priority IN ('Low', 'Medium', 'High')),
    effort_estimate INTEGER,
    acceptance_criteria JSONB NOT NULL DEFAULT '[]',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_stories_organization ON stories(organization_id);
CREATE INDEX idx_stories_epic ON stories(epic_id);
";

const PROJECTS_SQL: &str = r"
CREATE TABLE projects (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    status VARCHAR(20) NOT NULL DEFAULT 'Open'
        CHECK (status IN ('Open', 'InProgress', 'Resolved', 'OnHold')),
    priority VARCHAR(10) NOT NULL DEFAULT 'Medium'
        CHECK (priority IN ('Low', 'Medium', 'High')),
    budget NUMERIC(14, 2),
    start_date DATE,
    end_date DATE,
    project_manager_id INTEGER REFERENCES users(id),
    department_id INTEGER REFERENCES departments(id) ON DELETE RESTRICT,
    case_id INTEGER REFERENCES business_cases(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_projects_organization ON projects(organization_id);
CREATE INDEX idx_projects_department ON projects(department_id);
CREATE INDEX idx_projects_case ON projects(case_id);

ALTER TABLE epics
    ADD CONSTRAINT fk_epics_project
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE SET NULL;
";

const PROJECT_MILESTONES_SQL: &str = r"
CREATE TABLE project_milestones (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    owner_id INTEGER REFERENCES users(id),
    due_date DATE NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    completion_date DATE,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CHECK (NOT completed OR completion_date IS NOT NULL)
);

CREATE INDEX idx_milestones_organization ON project_milestones(organization_id);
CREATE INDEX idx_milestones_project ON project_milestones(project_id);
CREATE INDEX idx_milestones_due ON project_milestones(organization_id, due_date)
    WHERE NOT completed;
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    message TEXT NOT NULL,
    link VARCHAR(512),
    event_type VARCHAR(64),
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    is_escalation BOOLEAN NOT NULL DEFAULT FALSE,
    email_sent BOOLEAN NOT NULL DEFAULT FALSE,
    email_sent_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_notifications_organization ON notifications(organization_id);
CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);
";

const NOTIFICATION_SETTINGS_SQL: &str = r"
CREATE TABLE notification_settings (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    event_name VARCHAR(64) NOT NULL,
    frequency VARCHAR(10) NOT NULL DEFAULT 'immediate'
        CHECK (frequency IN ('immediate', 'hourly', 'daily', 'weekly')),
    threshold_hours INTEGER CHECK (threshold_hours > 0),
    channel_email BOOLEAN NOT NULL DEFAULT FALSE,
    channel_in_app BOOLEAN NOT NULL DEFAULT TRUE,
    channel_push BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (organization_id, event_name)
);

CREATE INDEX idx_notification_settings_organization ON notification_settings(organization_id);
";

const NOTIFICATION_TEMPLATES_SQL: &str = r"
CREATE TABLE notification_templates (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    event_name VARCHAR(64) NOT NULL,
    subject_template TEXT NOT NULL,
    body_template TEXT NOT NULL,
    email_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    in_app_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (organization_id, event_name)
);

CREATE INDEX idx_notification_templates_organization ON notification_templates(organization_id);
";

const WORKFLOW_TEMPLATES_SQL: &str = r"
CREATE TABLE workflow_templates (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    definition JSONB NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_by INTEGER REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_workflow_templates_organization ON workflow_templates(organization_id);
CREATE INDEX idx_workflow_templates_active ON workflow_templates(organization_id, is_active);
";

const WORKFLOW_LIBRARY_SQL: &str = r"
CREATE TABLE workflow_library (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    category VARCHAR(64),
    description TEXT,
    definition JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const REPORT_TEMPLATES_SQL: &str = r"
CREATE TABLE report_templates (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    frequency VARCHAR(10) NOT NULL
        CHECK (frequency IN ('Daily', 'Weekly', 'Monthly')),
    template_type VARCHAR(20) NOT NULL DEFAULT 'DashboardSummary'
        CHECK (template_type IN ('DashboardSummary', 'TrendReport', 'RiskReport', 'Custom')),
    filters JSONB NOT NULL DEFAULT '{}',
    recipients JSONB NOT NULL DEFAULT '[]',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_run_at TIMESTAMPTZ,
    created_by INTEGER REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_report_templates_organization ON report_templates(organization_id);
CREATE INDEX idx_report_templates_active ON report_templates(organization_id, is_active);
";

const REPORT_RUNS_SQL: &str = r"
CREATE TABLE report_runs (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    template_id INTEGER NOT NULL REFERENCES report_templates(id) ON DELETE CASCADE,
    status VARCHAR(10) NOT NULL DEFAULT 'running'
        CHECK (status IN ('running', 'completed', 'failed')),
    artifact_path VARCHAR(512),
    emails_sent INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at TIMESTAMPTZ
);

CREATE INDEX idx_report_runs_organization ON report_runs(organization_id);
CREATE INDEX idx_report_runs_template ON report_runs(template_id);
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    action VARCHAR(128) NOT NULL,
    target VARCHAR(255),
    details JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_audit_logs_organization ON audit_logs(organization_id);
CREATE INDEX idx_audit_logs_created ON audit_logs(organization_id, created_at);
";

const DELAYED_JOBS_SQL: &str = r"
CREATE TABLE delayed_jobs (
    id SERIAL PRIMARY KEY,
    organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    job_type VARCHAR(32) NOT NULL
        CHECK (job_type IN ('escalation', 'batched_email', 'follow_up')),
    run_at TIMESTAMPTZ NOT NULL,
    payload JSONB NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    processed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_delayed_jobs_due ON delayed_jobs(run_at) WHERE processed_at IS NULL;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS delayed_jobs CASCADE;
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS report_runs CASCADE;
DROP TABLE IF EXISTS report_templates CASCADE;
DROP TABLE IF EXISTS workflow_library CASCADE;
DROP TABLE IF EXISTS workflow_templates CASCADE;
DROP TABLE IF EXISTS notification_templates CASCADE;
DROP TABLE IF EXISTS notification_settings CASCADE;
DROP TABLE IF EXISTS notifications CASCADE;
DROP TABLE IF EXISTS project_milestones CASCADE;
DROP TABLE IF EXISTS projects CASCADE;
DROP TABLE IF EXISTS stories CASCADE;
DROP TABLE IF EXISTS epics CASCADE;
DROP TABLE IF EXISTS business_cases CASCADE;
DROP TABLE IF EXISTS problems CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS departments CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;
";
