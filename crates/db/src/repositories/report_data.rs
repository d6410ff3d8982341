//! Dataset collection for scheduled reports.
//!
//! Each method materializes one named dataset as JSON rows ready for the
//! report renderer. All queries are tenant-scoped aggregate SQL; a dataset
//! the schema cannot answer simply is not collected and renders as an
//! empty placeholder.

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement};
use serde_json::{json, Value};

/// Read-only aggregate queries backing report datasets.
#[derive(Debug, Clone)]
pub struct ReportDataRepository {
    db: DatabaseConnection,
}

const STATUS_BREAKDOWN_SQL: &str = r"
SELECT 'problem' AS entity_type, status, COUNT(*) AS count
FROM problems WHERE organization_id = $1 GROUP BY status
UNION ALL
SELECT 'case' AS entity_type, status, COUNT(*) AS count
FROM business_cases WHERE organization_id = $1 GROUP BY status
UNION ALL
SELECT 'project' AS entity_type, status, COUNT(*) AS count
FROM projects WHERE organization_id = $1 GROUP BY status
ORDER BY entity_type, status
";

const PROBLEM_TRENDS_SQL: &str = r"
SELECT created_at::date AS day, COUNT(*) AS count
FROM problems
WHERE organization_id = $1 AND created_at >= NOW() - ($2 || ' days')::interval
GROUP BY created_at::date
ORDER BY day
";

const CASE_CONVERSION_SQL: &str = r"
SELECT
    (SELECT COUNT(*) FROM problems WHERE organization_id = $1) AS problems,
    (SELECT COUNT(*) FROM business_cases WHERE organization_id = $1) AS cases,
    (SELECT COUNT(*) FROM business_cases
        WHERE organization_id = $1 AND status = 'Approved') AS approved_cases,
    (SELECT COUNT(*) FROM projects WHERE organization_id = $1) AS projects
";

const PROJECT_METRICS_SQL: &str = r"
SELECT p.id, p.name, p.status, p.priority, p.budget,
       COUNT(m.id) AS milestones_total,
       COUNT(m.id) FILTER (WHERE m.completed) AS milestones_completed
FROM projects p
LEFT JOIN project_milestones m ON m.project_id = p.id
WHERE p.organization_id = $1
GROUP BY p.id, p.name, p.status, p.priority, p.budget
ORDER BY p.created_at DESC
";

const RISKS_ISSUES_SQL: &str = r"
SELECT id, title, risk_level AS severity, status
FROM business_cases
WHERE organization_id = $1 AND risk_level IS NOT NULL
ORDER BY CASE risk_level WHEN 'High' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END, id
";

const MILESTONE_BURNDOWN_SQL: &str = r"
SELECT m.id, m.name, m.due_date, m.completed, p.name AS project,
       (NOT m.completed AND m.due_date < $2) AS overdue
FROM project_milestones m
JOIN projects p ON p.id = m.project_id
WHERE m.organization_id = $1
ORDER BY m.due_date
";

const DEPARTMENT_HEATMAP_SQL: &str = r"
SELECT d.name AS department,
       COUNT(pr.id) AS problems,
       COUNT(pj.id) AS projects
FROM departments d
LEFT JOIN problems pr ON pr.department_id = d.id
LEFT JOIN projects pj ON pj.department_id = d.id
WHERE d.organization_id = $1
GROUP BY d.name
ORDER BY problems DESC
";

const ROI_WATERFALL_SQL: &str = r"
SELECT id, title, roi
FROM business_cases
WHERE organization_id = $1 AND roi IS NOT NULL
ORDER BY roi DESC
";

const TIME_TO_VALUE_SQL: &str = r"
SELECT p.name AS project,
       (p.created_at::date - pr.created_at::date) AS days
FROM projects p
JOIN business_cases bc ON bc.id = p.case_id
JOIN problems pr ON pr.id = bc.problem_id
WHERE p.organization_id = $1
ORDER BY days DESC
";

const RESOURCE_UTILIZATION_SQL: &str = r"
SELECT role, COUNT(*) AS users
FROM users
WHERE organization_id = $1
GROUP BY role
ORDER BY users DESC
";

impl ReportDataRepository {
    /// Creates a new report data repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Status counts per entity type. Rows: `entity_type`, `status`, `count`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn status_breakdown(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(STATUS_BREAKDOWN_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "entity_type": row.try_get::<String>("", "entity_type")?,
                    "status": row.try_get::<String>("", "status")?,
                    "count": row.try_get::<i64>("", "count")?,
                }))
            })
            .collect()
    }

    /// Problems reported per day over the trailing window.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn problem_trends(
        &self,
        organization_id: i32,
        window_days: i32,
    ) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(
                PROBLEM_TRENDS_SQL,
                [organization_id.into(), window_days.to_string().into()],
            )
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "date": row.try_get::<NaiveDate>("", "day")?.to_string(),
                    "count": row.try_get::<i64>("", "count")?,
                }))
            })
            .collect()
    }

    /// Funnel counts from problems through approved cases to projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn case_conversion(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(CASE_CONVERSION_SQL, [organization_id.into()])
            .await?;
        let Some(row) = rows.first() else {
            return Ok(Vec::new());
        };
        Ok(vec![
            json!({"stage": "Problems", "count": row.try_get::<i64>("", "problems")?}),
            json!({"stage": "Business cases", "count": row.try_get::<i64>("", "cases")?}),
            json!({"stage": "Approved", "count": row.try_get::<i64>("", "approved_cases")?}),
            json!({"stage": "Projects", "count": row.try_get::<i64>("", "projects")?}),
        ])
    }

    /// Per-project budget and milestone progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn project_metrics(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(PROJECT_METRICS_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                let budget: Option<rust_decimal::Decimal> = row.try_get("", "budget")?;
                Ok(json!({
                    "name": row.try_get::<String>("", "name")?,
                    "status": row.try_get::<String>("", "status")?,
                    "priority": row.try_get::<String>("", "priority")?,
                    "budget": budget.map(|b| b.to_string()),
                    "milestones_total": row.try_get::<i64>("", "milestones_total")?,
                    "milestones_completed": row.try_get::<i64>("", "milestones_completed")?,
                }))
            })
            .collect()
    }

    /// Cases carrying a risk tag, highest severity first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn risks_issues(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(RISKS_ISSUES_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "title": row.try_get::<String>("", "title")?,
                    "severity": row.try_get::<String>("", "severity")?,
                    "status": row.try_get::<String>("", "status")?,
                }))
            })
            .collect()
    }

    /// Milestones with an overdue flag as of `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn milestone_burndown(
        &self,
        organization_id: i32,
        today: NaiveDate,
    ) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(
                MILESTONE_BURNDOWN_SQL,
                [organization_id.into(), today.into()],
            )
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "name": row.try_get::<String>("", "name")?,
                    "project": row.try_get::<String>("", "project")?,
                    "due_date": row.try_get::<NaiveDate>("", "due_date")?.to_string(),
                    "completed": row.try_get::<bool>("", "completed")?,
                    "overdue": row.try_get::<bool>("", "overdue")?,
                }))
            })
            .collect()
    }

    /// Problem and project counts per department.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn department_heatmap(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(DEPARTMENT_HEATMAP_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "department": row.try_get::<String>("", "department")?,
                    "problems": row.try_get::<i64>("", "problems")?,
                    "projects": row.try_get::<i64>("", "projects")?,
                }))
            })
            .collect()
    }

    /// Case ROI ranked descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn roi_waterfall(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(ROI_WATERFALL_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                let roi: rust_decimal::Decimal = row.try_get("", "roi")?;
                Ok(json!({
                    "title": row.try_get::<String>("", "title")?,
                    "roi_percent": roi.to_string(),
                }))
            })
            .collect()
    }

    /// Days from problem report to project creation, per delivered project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn time_to_value(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(TIME_TO_VALUE_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "project": row.try_get::<String>("", "project")?,
                    "days": row.try_get::<i32>("", "days")?,
                }))
            })
            .collect()
    }

    /// Headcount per role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn resource_utilization(&self, organization_id: i32) -> Result<Vec<Value>, DbErr> {
        let rows = self
            .query(RESOURCE_UTILIZATION_SQL, [organization_id.into()])
            .await?;
        rows.iter()
            .map(|row| {
                Ok(json!({
                    "role": row.try_get::<String>("", "role")?,
                    "users": row.try_get::<i64>("", "users")?,
                }))
            })
            .collect()
    }

    async fn query(
        &self,
        sql: &str,
        values: impl IntoIterator<Item = sea_orm::Value>,
    ) -> Result<Vec<sea_orm::QueryResult>, DbErr> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);
        self.db.query_all(stmt).await
    }
}
