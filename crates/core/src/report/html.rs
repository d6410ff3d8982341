//! HTML rendering for report layouts.
//!
//! One self-contained document per run, styled inline so it reads the same
//! in an email client and in the PDF conversion.

use serde_json::Value;

use super::summary::ExecutiveSummary;
use super::types::{ReportData, TemplateType};

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;color:#1f2933;margin:24px}\
h1{font-size:22px;border-bottom:2px solid #2563eb;padding-bottom:8px}\
h2{font-size:16px;margin-top:24px}\
table{border-collapse:collapse;width:100%;margin-top:8px}\
th,td{border:1px solid #d2d6dc;padding:6px 10px;text-align:left;font-size:13px}\
th{background:#f1f5f9}\
.summary{display:flex;gap:16px;flex-wrap:wrap;margin-top:16px}\
.metric{background:#f8fafc;border:1px solid #e2e8f0;padding:12px 18px;border-radius:6px}\
.metric .value{font-size:20px;font-weight:bold}\
.empty{color:#6b7280;font-style:italic}";

/// Renders the full HTML document for a run.
///
/// The layout picks which datasets appear; a dataset the collector did not
/// supply renders as an empty placeholder section.
#[must_use]
pub fn render_html(
    layout: TemplateType,
    data: &ReportData,
    summary: &ExecutiveSummary,
    generated_at: &str,
) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body>");

    html.push_str(&format!(
        "<h1>{}</h1><p>{} · generated {}</p>",
        escape(&data.title),
        layout.as_str(),
        escape(generated_at)
    ));

    render_summary(&mut html, summary);

    for name in layout.datasets() {
        match data.get(name) {
            Some(dataset) if !dataset.rows.is_empty() => {
                html.push_str(&format!("<h2>{}</h2>", escape(&dataset.label)));
                render_table(&mut html, &dataset.rows);
            }
            Some(dataset) => {
                html.push_str(&format!(
                    "<h2>{}</h2><p class=\"empty\">No data for this period.</p>",
                    escape(&dataset.label)
                ));
            }
            None => {
                html.push_str(&format!(
                    "<h2>{}</h2><p class=\"empty\">No data for this period.</p>",
                    escape(&label_for(name))
                ));
            }
        }
    }

    html.push_str("</body></html>");
    html
}

fn render_summary(html: &mut String, summary: &ExecutiveSummary) {
    html.push_str("<div class=\"summary\">");
    let mut metric = |label: &str, value: String| {
        html.push_str(&format!(
            "<div class=\"metric\"><div class=\"value\">{value}</div><div>{label}</div></div>"
        ));
    };
    metric("Problems", summary.total_problems.to_string());
    metric("Business cases", summary.total_cases.to_string());
    metric("Projects", summary.total_projects.to_string());
    metric("High risk", summary.high_risk_count.to_string());
    metric("Overdue milestones", summary.overdue_milestones.to_string());
    if let Some(avg) = summary.average_project_budget {
        metric("Avg project budget", format!("{avg:.0}"));
    }
    html.push_str("</div>");
}

fn render_table(html: &mut String, rows: &[Value]) {
    // Column order comes from the first row's keys.
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return;
    };
    let columns: Vec<&String> = first.keys().collect();

    html.push_str("<table><tr>");
    for col in &columns {
        html.push_str(&format!("<th>{}</th>", escape(col)));
    }
    html.push_str("</tr>");

    for row in rows {
        html.push_str("<tr>");
        for col in &columns {
            let cell = row
                .get(col.as_str())
                .map(cell_text)
                .unwrap_or_default();
            html.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn label_for(dataset_name: &str) -> String {
    let mut label = dataset_name.replace('_', " ");
    if let Some(first) = label.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    label
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::executive_summary;
    use serde_json::json;

    #[test]
    fn test_render_includes_title_and_metrics() {
        let data = ReportData::new("Weekly Portfolio");
        let summary = executive_summary(&data);
        let html = render_html(TemplateType::DashboardSummary, &data, &summary, "2025-03-14");
        assert!(html.contains("<h1>Weekly Portfolio</h1>"));
        assert!(html.contains("Overdue milestones"));
    }

    #[test]
    fn test_missing_dataset_renders_placeholder() {
        let data = ReportData::new("r");
        let summary = executive_summary(&data);
        let html = render_html(TemplateType::RiskReport, &data, &summary, "2025-03-14");
        assert!(html.contains("Risks issues"));
        assert!(html.contains("No data for this period."));
    }

    #[test]
    fn test_dataset_rows_render_as_table() {
        let mut data = ReportData::new("r");
        data.insert(
            "status_breakdown",
            "Status breakdown",
            vec![json!({"entity_type": "problem", "status": "Open", "count": 4})],
        );
        let summary = executive_summary(&data);
        let html = render_html(TemplateType::DashboardSummary, &data, &summary, "2025-03-14");
        assert!(html.contains("<h2>Status breakdown</h2>"));
        assert!(html.contains("<td>Open</td>"));
        assert!(html.contains("<td>4</td>"));
    }

    #[test]
    fn test_html_is_escaped() {
        let mut data = ReportData::new("<script>alert(1)</script>");
        data.insert("status_breakdown", "A&B", vec![]);
        let summary = executive_summary(&data);
        let html = render_html(TemplateType::DashboardSummary, &data, &summary, "now");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A&amp;B"));
    }
}
