//! PDF artifact writer.
//!
//! Renders the same content as the HTML layout into a paginated A4 document
//! and writes it to the reports directory.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

use super::summary::ExecutiveSummary;
use super::types::{ReportData, TemplateType};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 13.0;
const TITLE_SIZE: f32 = 18.0;

/// PDF writing failures.
#[derive(Debug, Error)]
pub enum PdfError {
    /// Filesystem error creating or writing the artifact.
    #[error("failed to write report artifact: {0}")]
    Io(#[from] std::io::Error),

    /// Document assembly error.
    #[error("failed to assemble report document: {0}")]
    Document(String),
}

/// Artifact filename: template id, run id, and a UTC timestamp.
#[must_use]
pub fn artifact_filename(template_id: i32, run_id: i32, now: DateTime<Utc>) -> String {
    format!(
        "report_{template_id}_{run_id}_{}.pdf",
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Writes the report as a PDF at `path`.
///
/// # Errors
///
/// Returns `PdfError` when the document cannot be assembled or written.
pub fn write_pdf(
    path: &Path,
    layout: TemplateType,
    data: &ReportData,
    summary: &ExecutiveSummary,
    generated_at: DateTime<Utc>,
) -> Result<(), PdfError> {
    let (doc, page, layer) = PdfDocument::new(
        data.title.clone(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Document(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Document(e.to_string()))?;

    let mut writer = PageWriter::new(&doc, page, layer, regular, bold);

    writer.heading(&data.title, TITLE_SIZE);
    writer.line(&format!(
        "{} · generated {}",
        layout.as_str(),
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    writer.blank();

    writer.heading("Executive summary", HEADING_SIZE);
    writer.line(&format!("Problems: {}", summary.total_problems));
    writer.line(&format!("Business cases: {}", summary.total_cases));
    writer.line(&format!("Projects: {}", summary.total_projects));
    writer.line(&format!("High-risk items: {}", summary.high_risk_count));
    writer.line(&format!("Overdue milestones: {}", summary.overdue_milestones));
    if let Some(avg) = summary.average_project_budget {
        writer.line(&format!("Average project budget: {avg:.0}"));
    }

    for name in layout.datasets() {
        writer.blank();
        match data.get(name) {
            Some(dataset) if !dataset.rows.is_empty() => {
                writer.heading(&dataset.label, HEADING_SIZE);
                for row in &dataset.rows {
                    writer.line(&row_line(row));
                }
            }
            Some(dataset) => {
                writer.heading(&dataset.label, HEADING_SIZE);
                writer.line("No data for this period.");
            }
            None => {
                writer.heading(name, HEADING_SIZE);
                writer.line("No data for this period.");
            }
        }
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| PdfError::Document(e.to_string()))?;
    Ok(())
}

fn row_line(row: &Value) -> String {
    match row.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}: {s}"),
                other => format!("{k}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("   "),
        None => row.to_string(),
    }
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: printpdf::PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor_mm: f32,
}

impl<'a> PageWriter<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        page: printpdf::PdfPageIndex,
        layer: printpdf::PdfLayerIndex,
        regular: IndirectFontRef,
        bold: IndirectFontRef,
    ) -> Self {
        Self {
            doc,
            layer: doc.get_page(page).get_layer(layer),
            regular,
            bold,
            cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn heading(&mut self, text: &str, size: f32) {
        self.advance(size / 2.0);
        let font = self.bold.clone();
        self.write(text, size, &font);
    }

    fn line(&mut self, text: &str) {
        let font = self.regular.clone();
        self.write(text, BODY_SIZE, &font);
    }

    fn blank(&mut self) {
        self.advance(LINE_HEIGHT_MM);
    }

    fn write(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.advance(LINE_HEIGHT_MM);
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.cursor_mm), font);
    }

    fn advance(&mut self, by_mm: f32) {
        self.cursor_mm -= by_mm;
        if self.cursor_mm < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM - LINE_HEIGHT_MM;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::executive_summary;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_artifact_filename_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 7, 0, 5).unwrap();
        assert_eq!(
            artifact_filename(12, 345, now),
            "report_12_345_20250314_070005.pdf"
        );
    }

    #[test]
    fn test_write_pdf_produces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");

        let mut data = ReportData::new("Weekly Portfolio");
        data.insert(
            "status_breakdown",
            "Status breakdown",
            vec![json!({"entity_type": "problem", "status": "Open", "count": 4})],
        );
        let summary = executive_summary(&data);

        write_pdf(
            &path,
            TemplateType::DashboardSummary,
            &data,
            &summary,
            Utc::now(),
        )
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_report_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.pdf");

        let mut data = ReportData::new("Everything");
        let rows: Vec<_> = (0..200).map(|i| json!({"index": i})).collect();
        data.insert("problem_trends", "Problem trends", rows);
        let summary = executive_summary(&data);

        write_pdf(&path, TemplateType::Custom, &data, &summary, Utc::now()).unwrap();
        assert!(path.exists());
    }
}
