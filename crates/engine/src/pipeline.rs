//! Scheduled report pipeline.
//!
//! Collect, summarize, render, convert, distribute, record. Every failure
//! inside a run is captured on the `ReportRun` row; the pipeline itself
//! never raises past [`ReportPipeline::run`].

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use deciframe_core::auth::Role;
use deciframe_core::report::{
    artifact_filename, executive_summary, render_html, write_pdf, ReportData, TemplateType,
};
use deciframe_db::entities::report_templates;
use deciframe_db::repositories::{ReportDataRepository, ReportRepository, UserRepository};

use crate::dispatch::Mailer;

const TREND_WINDOW_DAYS: i32 = 30;

/// End-to-end execution of one report template.
#[derive(Clone)]
pub struct ReportPipeline {
    reports: ReportRepository,
    data: ReportDataRepository,
    users: UserRepository,
    mailer: Option<Arc<dyn Mailer>>,
    reports_dir: PathBuf,
}

impl ReportPipeline {
    /// Creates a pipeline writing artifacts under `reports_dir`.
    #[must_use]
    pub fn new(
        reports: ReportRepository,
        data: ReportDataRepository,
        users: UserRepository,
        mailer: Option<Arc<dyn Mailer>>,
        reports_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reports,
            data,
            users,
            mailer,
            reports_dir: reports_dir.into(),
        }
    }

    /// Runs one template: opens a run row, executes the pipeline, closes
    /// the run, and stamps the template's last-run gate.
    pub async fn run(&self, template: &report_templates::Model) {
        let organization_id = template.organization_id;
        let run = match self.reports.start_run(organization_id, template.id).await {
            Ok(run) => run,
            Err(e) => {
                error!(template_id = template.id, error = %e, "could not open report run");
                return;
            }
        };

        let close_result = match self.execute(template, run.id).await {
            Ok((artifact_path, emails_sent)) => {
                info!(
                    template_id = template.id,
                    run_id = run.id,
                    emails_sent,
                    "report run completed"
                );
                self.reports
                    .complete_run(run.id, &artifact_path, emails_sent)
                    .await
            }
            Err(message) => {
                warn!(template_id = template.id, run_id = run.id, error = %message, "report run failed");
                self.reports.fail_run(run.id, &message).await
            }
        };
        if let Err(e) = close_result {
            error!(run_id = run.id, error = %e, "could not close report run");
        }

        // Stamp even after a failure so a broken template fires once per
        // period instead of every scheduler tick.
        if let Err(e) = self
            .reports
            .mark_template_run(organization_id, template.id, Utc::now())
            .await
        {
            error!(template_id = template.id, error = %e, "could not stamp last run");
        }
    }

    async fn execute(
        &self,
        template: &report_templates::Model,
        run_id: i32,
    ) -> Result<(String, i32), String> {
        let organization_id = template.organization_id;
        let layout = TemplateType::parse(&template.template_type);
        let generated_at = Utc::now();

        // Collect. A failed collector degrades to an empty section.
        let mut data = ReportData::new(template.name.clone());
        for name in layout.datasets() {
            let rows = self.collect(organization_id, name).await;
            data.insert(name, dataset_label(name), rows);
        }

        // Summarize and render.
        let summary = executive_summary(&data);
        let html = render_html(
            layout,
            &data,
            &summary,
            &generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        );

        // Convert.
        std::fs::create_dir_all(&self.reports_dir)
            .map_err(|e| format!("could not create reports directory: {e}"))?;
        let filename = artifact_filename(template.id, run_id, generated_at);
        let path = self.reports_dir.join(&filename);
        write_pdf(&path, layout, &data, &summary, generated_at)
            .map_err(|e| format!("pdf generation failed: {e}"))?;

        // Distribute.
        let recipients = self
            .resolve_recipients(organization_id, &template.recipients)
            .await;
        let mut emails_sent = 0;
        if let Some(mailer) = &self.mailer {
            let subject = format!("{} — {}", template.name, generated_at.format("%Y-%m-%d"));
            for address in &recipients {
                match mailer
                    .send_with_attachment(address, &subject, &html, &path, &filename)
                    .await
                {
                    Ok(()) => emails_sent += 1,
                    Err(e) => {
                        warn!(address = %address, error = %e, "report email failed");
                    }
                }
            }
        }

        Ok((path.to_string_lossy().into_owned(), emails_sent))
    }

    async fn collect(&self, organization_id: i32, name: &str) -> Vec<Value> {
        let today = Utc::now().date_naive();
        let result = match name {
            "problem_trends" => {
                self.data
                    .problem_trends(organization_id, TREND_WINDOW_DAYS)
                    .await
            }
            "case_conversion" => self.data.case_conversion(organization_id).await,
            "project_metrics" => self.data.project_metrics(organization_id).await,
            "status_breakdown" => self.data.status_breakdown(organization_id).await,
            "department_heatmap" => self.data.department_heatmap(organization_id).await,
            "time_to_value" => self.data.time_to_value(organization_id).await,
            "risks_issues" => self.data.risks_issues(organization_id).await,
            "roi_waterfall" => self.data.roi_waterfall(organization_id).await,
            "milestone_burndown" => self.data.milestone_burndown(organization_id, today).await,
            "resource_utilization" => self.data.resource_utilization(organization_id).await,
            // No collector (problem_clusters needs the ML pipeline).
            _ => Ok(Vec::new()),
        };
        match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!(dataset = name, error = %e, "dataset collection failed; rendering empty");
                Vec::new()
            }
        }
    }

    /// Resolves the stored mailing list. Entries may be a user id, a role
    /// name, or a literal address; the result is deduplicated.
    async fn resolve_recipients(
        &self,
        organization_id: i32,
        recipients: &Value,
    ) -> Vec<String> {
        let mut addresses = BTreeSet::new();
        let entries = recipients.as_array().cloned().unwrap_or_default();

        for entry in entries {
            match entry {
                Value::Number(n) => {
                    let Some(user_id) = n.as_i64().and_then(|id| i32::try_from(id).ok()) else {
                        continue;
                    };
                    match self.users.find_by_id(organization_id, user_id).await {
                        Ok(Some(user)) => {
                            addresses.insert(user.email);
                        }
                        Ok(None) => {
                            warn!(user_id, "report recipient not found; skipping");
                        }
                        Err(e) => {
                            warn!(user_id, error = %e, "recipient lookup failed; skipping");
                        }
                    }
                }
                Value::String(s) => {
                    if s.contains('@') {
                        addresses.insert(s);
                    } else if let Some(role) = Role::parse(&s) {
                        match self.users.list_by_role(organization_id, role).await {
                            Ok(users) => {
                                addresses.extend(users.into_iter().map(|u| u.email));
                            }
                            Err(e) => {
                                warn!(role = %s, error = %e, "role expansion failed; skipping");
                            }
                        }
                    } else {
                        warn!(entry = %s, "unrecognized report recipient entry; skipping");
                    }
                }
                _ => {}
            }
        }
        addresses.into_iter().collect()
    }
}

fn dataset_label(name: &str) -> &'static str {
    match name {
        "problem_trends" => "Problem trends",
        "case_conversion" => "Case conversion funnel",
        "project_metrics" => "Project metrics",
        "status_breakdown" => "Status breakdown",
        "department_heatmap" => "Department heatmap",
        "time_to_value" => "Time to value",
        "risks_issues" => "Risks and issues",
        "roi_waterfall" => "ROI waterfall",
        "problem_clusters" => "Problem clusters",
        "milestone_burndown" => "Milestone burndown",
        "resource_utilization" => "Resource utilization",
        _ => "Dataset",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_canonical_dataset_has_a_label() {
        for name in deciframe_core::report::DATASET_NAMES {
            assert_ne!(dataset_label(name), "Dataset", "{name}");
        }
    }
}
