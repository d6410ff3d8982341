//! Executive summary computed from collected datasets.

use serde::Serialize;
use serde_json::Value;

use super::types::ReportData;

/// Headline metrics shown at the top of every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    /// Total problems in the reporting window.
    pub total_problems: u64,
    /// Total business cases.
    pub total_cases: u64,
    /// Total projects.
    pub total_projects: u64,
    /// Entries flagged high risk in the risks/issues dataset.
    pub high_risk_count: u64,
    /// Overdue milestones from the burndown dataset.
    pub overdue_milestones: u64,
    /// Mean project budget, when the metrics dataset reports budgets.
    pub average_project_budget: Option<f64>,
}

/// Computes the summary from whatever datasets were collected.
///
/// Absent datasets contribute zeros; the summary never fails.
#[must_use]
pub fn executive_summary(data: &ReportData) -> ExecutiveSummary {
    let count_in = |dataset: &str, entity: &str| -> u64 {
        data.get(dataset)
            .map(|d| {
                d.rows
                    .iter()
                    .filter(|row| row_str(row, "entity_type") == Some(entity))
                    .filter_map(|row| row_u64(row, "count"))
                    .sum()
            })
            .unwrap_or(0)
    };

    let high_risk_count = data
        .get("risks_issues")
        .map(|d| {
            d.rows
                .iter()
                .filter(|row| row_str(row, "severity") == Some("High"))
                .count() as u64
        })
        .unwrap_or(0);

    let overdue_milestones = data
        .get("milestone_burndown")
        .map(|d| {
            d.rows
                .iter()
                .filter(|row| row.get("overdue").and_then(Value::as_bool) == Some(true))
                .count() as u64
        })
        .unwrap_or(0);

    let average_project_budget = data.get("project_metrics").and_then(|d| {
        let budgets: Vec<f64> = d
            .rows
            .iter()
            .filter_map(|row| row.get("budget").and_then(Value::as_f64))
            .collect();
        if budgets.is_empty() {
            None
        } else {
            Some(budgets.iter().sum::<f64>() / budgets.len() as f64)
        }
    });

    ExecutiveSummary {
        total_problems: count_in("status_breakdown", "problem"),
        total_cases: count_in("status_breakdown", "case"),
        total_projects: count_in("status_breakdown", "project"),
        high_risk_count,
        overdue_milestones,
        average_project_budget,
    }
}

fn row_str<'a>(row: &'a Value, key: &str) -> Option<&'a str> {
    row.get(key)?.as_str()
}

fn row_u64(row: &Value, key: &str) -> Option<u64> {
    row.get(key)?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_data_yields_zeros() {
        let summary = executive_summary(&ReportData::new("empty"));
        assert_eq!(summary, ExecutiveSummary::default());
    }

    #[test]
    fn test_summary_aggregates_datasets() {
        let mut data = ReportData::new("weekly");
        data.insert(
            "status_breakdown",
            "Status breakdown",
            vec![
                json!({"entity_type": "problem", "status": "Open", "count": 4}),
                json!({"entity_type": "problem", "status": "Resolved", "count": 6}),
                json!({"entity_type": "case", "status": "Approved", "count": 3}),
                json!({"entity_type": "project", "status": "InProgress", "count": 2}),
            ],
        );
        data.insert(
            "risks_issues",
            "Risks and issues",
            vec![
                json!({"severity": "High", "title": "Vendor delay"}),
                json!({"severity": "Low", "title": "Minor scope creep"}),
            ],
        );
        data.insert(
            "milestone_burndown",
            "Milestone burndown",
            vec![
                json!({"name": "Alpha", "overdue": true}),
                json!({"name": "Beta", "overdue": false}),
            ],
        );
        data.insert(
            "project_metrics",
            "Project metrics",
            vec![
                json!({"name": "Apollo", "budget": 100000.0}),
                json!({"name": "Borealis", "budget": 50000.0}),
            ],
        );

        let summary = executive_summary(&data);
        assert_eq!(summary.total_problems, 10);
        assert_eq!(summary.total_cases, 3);
        assert_eq!(summary.total_projects, 2);
        assert_eq!(summary.high_risk_count, 1);
        assert_eq!(summary.overdue_milestones, 1);
        assert_eq!(summary.average_project_budget, Some(75000.0));
    }
}
