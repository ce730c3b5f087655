use std::path::Path;
use std::time::Instant;

use crate::index::{ByteSource, LineIndex};
use crate::sections::{MarkerSet, SectionIndex};
use crate::types::Result;

/// The cooperative driving loop. Both structures are advanced in bounded
/// ticks; `progress` runs between indexing ticks so a front end can render
/// while a large file is scanned. Nothing here spawns threads or blocks.
pub fn index_file(
    path: &Path,
    chunk_bytes: usize,
    mut progress: impl FnMut(usize, usize),
) -> Result<LineIndex> {
    let started = Instant::now();
    let source = ByteSource::open(path)?;
    let mut index = LineIndex::new(source);

    while !index.advance(chunk_bytes) {
        tracing::debug!(
            scanned = index.scanned_bytes(),
            total = index.total_bytes(),
            "indexing tick"
        );
        progress(index.scanned_bytes(), index.total_bytes());
    }

    tracing::debug!(
        lines = index.line_count(),
        bytes = index.total_bytes(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "line index complete"
    );
    Ok(index)
}

/// Classifies every line of a fully indexed file against `markers`,
/// `chunk_lines` lines per tick.
pub fn classify(index: &LineIndex, markers: MarkerSet, chunk_lines: usize) -> Result<SectionIndex> {
    let started = Instant::now();
    let mut sections = SectionIndex::new(markers, index.line_count());

    while !sections.advance(chunk_lines, index)? {
        tracing::debug!(
            scanned = sections.scanned_lines(),
            total = sections.line_count(),
            "classification tick"
        );
    }

    tracing::debug!(
        sections = sections.spans().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "classification complete"
    );
    Ok(sections)
}
