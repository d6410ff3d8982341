//! Report template vocabulary and collected-data container.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How often a template is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFrequency {
    /// Every day at the report hour.
    Daily,
    /// Mondays at the report hour.
    Weekly,
    /// First of the month at the report hour.
    Monthly,
}

impl ReportFrequency {
    /// Parses the stored form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Daily" => Some(Self::Daily),
            "Weekly" => Some(Self::Weekly),
            "Monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    /// The stored form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

/// Which layout a template renders with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateType {
    /// High-level counts and the executive summary.
    #[default]
    DashboardSummary,
    /// Trend-oriented datasets (problem trends, conversion, burndown).
    TrendReport,
    /// Risk and overdue-focused datasets.
    RiskReport,
    /// Every collected dataset, unfiltered.
    Custom,
}

impl TemplateType {
    /// Parses the stored form; unknown values fall back to `Custom`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "DashboardSummary" => Self::DashboardSummary,
            "TrendReport" => Self::TrendReport,
            "RiskReport" => Self::RiskReport,
            _ => Self::Custom,
        }
    }

    /// The stored form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DashboardSummary => "DashboardSummary",
            Self::TrendReport => "TrendReport",
            Self::RiskReport => "RiskReport",
            Self::Custom => "Custom",
        }
    }

    /// The datasets this layout displays, in render order.
    #[must_use]
    pub fn datasets(&self) -> &'static [&'static str] {
        match self {
            Self::DashboardSummary => &[
                "status_breakdown",
                "project_metrics",
                "department_heatmap",
            ],
            Self::TrendReport => &[
                "problem_trends",
                "case_conversion",
                "time_to_value",
                "milestone_burndown",
            ],
            Self::RiskReport => &["risks_issues", "status_breakdown", "resource_utilization"],
            Self::Custom => DATASET_NAMES,
        }
    }
}

/// Canonical dataset names, in collection order.
pub const DATASET_NAMES: &[&str] = &[
    "problem_trends",
    "case_conversion",
    "project_metrics",
    "status_breakdown",
    "department_heatmap",
    "time_to_value",
    "risks_issues",
    "roi_waterfall",
    "problem_clusters",
    "milestone_burndown",
    "resource_utilization",
];

/// One collected dataset: a label and its rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Human-readable label for the rendered section.
    pub label: String,
    /// Structured rows; empty when the collector had nothing to report.
    pub rows: Vec<Value>,
}

/// All datasets collected for one run, keyed by canonical name.
///
/// A missing key renders as an empty placeholder section, never a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportData {
    /// Report display title.
    pub title: String,
    /// Datasets by canonical name.
    pub datasets: BTreeMap<String, Dataset>,
}

impl ReportData {
    /// Creates an empty report with a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            datasets: BTreeMap::new(),
        }
    }

    /// Inserts a collected dataset.
    pub fn insert(&mut self, name: &str, label: impl Into<String>, rows: Vec<Value>) {
        self.datasets.insert(
            name.to_string(),
            Dataset {
                label: label.into(),
                rows,
            },
        );
    }

    /// Looks up a dataset by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_round_trip() {
        for s in ["Daily", "Weekly", "Monthly"] {
            assert_eq!(ReportFrequency::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(ReportFrequency::parse("Hourly"), None);
    }

    #[test]
    fn test_template_type_falls_back_to_custom() {
        assert_eq!(TemplateType::parse("TrendReport"), TemplateType::TrendReport);
        assert_eq!(TemplateType::parse("Bespoke"), TemplateType::Custom);
    }

    #[test]
    fn test_layout_datasets_are_canonical() {
        for layout in [
            TemplateType::DashboardSummary,
            TemplateType::TrendReport,
            TemplateType::RiskReport,
            TemplateType::Custom,
        ] {
            for name in layout.datasets() {
                assert!(DATASET_NAMES.contains(name), "{name}");
            }
        }
    }
}
