use owo_colors::OwoColorize;

use super::SectionReport;

pub fn render(report: &SectionReport) {
    println!();
    println!("  {}", "\u{2501}".repeat(50).dimmed());
    if report.spans.is_empty() {
        println!("  {}", "no sections found".green());
        println!("  {}", "\u{2501}".repeat(50).dimmed());
        println!();
        return;
    }

    println!(
        "  {} across {} lines in {}",
        format!("{} sections", report.spans.len()).bold(),
        report.line_count,
        report.file.display().to_string().dimmed()
    );
    println!("  {}", "\u{2501}".repeat(50).dimmed());
    println!();

    // Spans arrive in start order, so nesting depth is just how many open
    // ends are still ahead of this start.
    let mut open_ends: Vec<usize> = Vec::new();
    let name_width = report.spans.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for span in &report.spans {
        while open_ends.last().is_some_and(|&end| end <= span.start) {
            open_ends.pop();
        }
        let indent = "  ".repeat(open_ends.len());
        println!(
            "  {indent}{} {}",
            format!("{:<name_width$}", span.name).cyan().bold(),
            // 1-based inclusive for humans; the exclusive 0-based end is the
            // same number as the inclusive 1-based one.
            format!("L{}-L{}", span.start + 1, span.end).dimmed(),
        );
        open_ends.push(span.end);
    }

    println!();
}
