use serde::Serialize;

use super::SectionReport;
use crate::types::SectionSpan;

#[derive(Serialize)]
struct JsonOutput<'a> {
    file: String,
    line_count: usize,
    sections: &'a [SectionSpan],
}

fn build_output(report: &SectionReport) -> JsonOutput<'_> {
    JsonOutput {
        file: report.file.display().to_string(),
        line_count: report.line_count,
        sections: &report.spans,
    }
}

pub fn render(report: &SectionReport) {
    let output = build_output(report);
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
