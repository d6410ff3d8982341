//! Report generation core: dataset shapes, executive summary, HTML layouts,
//! and the PDF artifact writer.
//!
//! Data collection and email distribution are database/network concerns and
//! live in the `engine` crate; everything here operates on already-collected
//! data.

mod html;
mod pdf;
mod summary;
mod types;

pub use html::render_html;
pub use pdf::{artifact_filename, write_pdf, PdfError};
pub use summary::{executive_summary, ExecutiveSummary};
pub use types::{Dataset, ReportData, ReportFrequency, TemplateType, DATASET_NAMES};
