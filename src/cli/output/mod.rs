pub mod json;
pub mod text;

use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::types::SectionSpan;

/// What the `sections` command produces: every section of one classified
/// file, in start-line order. Spans are 0-based with exclusive ends; the
/// text renderer converts to 1-based inclusive for display.
pub struct SectionReport {
    pub file: PathBuf,
    pub line_count: usize,
    pub spans: Vec<SectionSpan>,
}

pub fn render(report: &SectionReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
    }
}
