pub mod source;

use memchr::memchr;

pub use source::ByteSource;

use crate::types::{Error, Result};

/// Incremental newline index over a [`ByteSource`].
///
/// Boundary discovery is resumable: each [`advance`](LineIndex::advance) call
/// scans at most a caller-chosen number of bytes and picks up exactly where
/// the previous call stopped, so a driving loop can interleave rendering (or
/// any other work) while a large file is indexed.
///
/// `boundaries[i]` is the newline offset ending line `i - 1`, seeded with a
/// `-1` sentinel so line `i` always occupies `boundaries[i]+1 .. boundaries[i+1]`.
/// The vector is append-only and values are monotonically non-decreasing.
pub struct LineIndex {
    source: ByteSource,
    boundaries: Vec<i64>,
    scanned_bytes: usize,
}

impl LineIndex {
    pub fn new(source: ByteSource) -> Self {
        Self {
            source,
            boundaries: vec![-1],
            scanned_bytes: 0,
        }
    }

    /// Scans at most `max_bytes` further input for line boundaries. Returns
    /// whether the whole source is now indexed. A zero-length source is
    /// complete on the first call with zero lines.
    pub fn advance(&mut self, max_bytes: usize) -> bool {
        let total = self.source.len() as i64;
        let mut i = *self.boundaries.last().unwrap_or(&-1);
        let budget = i64::try_from(max_bytes).unwrap_or(i64::MAX);
        let stop_at = (total - 1).min(i.saturating_add(budget));

        while i < stop_at {
            let from = (i + 1) as usize;
            // A final line with no trailing newline gets the end of input as
            // its closing boundary.
            let j = match memchr(b'\n', &self.source[from..]) {
                Some(off) => (from + off) as i64,
                None => total,
            };
            self.boundaries.push(j);
            i = j;
        }

        self.scanned_bytes = total.min(self.boundaries.last().unwrap_or(&-1) + 1) as usize;
        self.is_complete()
    }

    /// Lines fully delimited so far. Final once [`is_complete`](Self::is_complete).
    pub fn line_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Raw bytes of line `i`, newline excluded.
    pub fn line(&self, i: usize) -> Result<&[u8]> {
        if i >= self.line_count() {
            return Err(Error::OutOfRange {
                line: i,
                count: self.line_count(),
            });
        }
        let start = (self.boundaries[i] + 1) as usize;
        let end = self.boundaries[i + 1] as usize;
        Ok(&self.source[start..end])
    }

    /// Offset up to which boundary discovery has completed. For progress
    /// reporting against [`total_bytes`](Self::total_bytes).
    pub fn scanned_bytes(&self) -> usize {
        self.scanned_bytes
    }

    pub fn total_bytes(&self) -> usize {
        self.source.len()
    }

    pub fn is_complete(&self) -> bool {
        self.scanned_bytes == self.source.len()
    }
}
