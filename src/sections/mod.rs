use regex::bytes::Regex;

use crate::config::Marker;
use crate::index::LineIndex;
use crate::types::{Error, Result, SectionSpan};

/// Ordered table of compiled start/end marker pairs. A marker's type-id is
/// its 1-based position in the table; 0 is reserved for "no open section".
#[derive(Debug)]
pub struct MarkerSet {
    markers: Vec<CompiledMarker>,
}

#[derive(Debug)]
struct CompiledMarker {
    name: String,
    start: Regex,
    end: Regex,
}

impl MarkerSet {
    /// Compiles the configured marker table. A bad regex fails the whole
    /// table rather than being skipped: dropping an entry would renumber the
    /// type-ids of everything after it.
    pub fn compile(configs: &[Marker]) -> Result<Self> {
        let markers = configs
            .iter()
            .map(|c| {
                let compile = |pattern: &str| {
                    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                        name: c.name.clone(),
                        source,
                    })
                };
                Ok(CompiledMarker {
                    name: c.name.clone(),
                    start: compile(&c.start)?,
                    end: compile(&c.end)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { markers })
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Marker name for a non-zero type-id.
    pub fn name(&self, type_id: usize) -> &str {
        &self.markers[type_id - 1].name
    }

    fn first_start_match(&self, text: &[u8]) -> Option<usize> {
        self.markers
            .iter()
            .position(|m| m.start.is_match(text))
            .map(|k| k + 1)
    }

    fn first_end_match(&self, text: &[u8]) -> Option<usize> {
        self.markers
            .iter()
            .position(|m| m.end.is_match(text))
            .map(|k| k + 1)
    }
}

/// One classified line: the innermost enclosing section's type and a
/// reference line.
///
/// While a section is open, every line in it (the start line included) points
/// back at the start. When the end marker is found on line `L`, the start
/// line's entry is retroactively patched to hold the exclusive closing
/// boundary `L + 1` instead. So after classification completes, a start
/// line's reference points forward (to the end) and every other member's
/// points backward (to the start); one indirection resolves either to the
/// full span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Entry {
    type_id: usize,
    line: usize,
}

/// Incremental nested-section classifier over a fully indexed [`LineIndex`].
///
/// Like the line index it is poll-driven: each [`advance`](Self::advance)
/// call classifies at most a caller-chosen number of lines. Sections left
/// open at end of input are force-closed at the total line count, innermost
/// first, so every line resolves without error.
pub struct SectionIndex {
    markers: MarkerSet,
    entries: Vec<Entry>,
    /// Saved (start, type) contexts for every enclosing section of the one
    /// currently open; empty at top level.
    stack: Vec<(usize, usize)>,
    current_start: usize,
    current_type: usize,
    scanned_lines: usize,
    complete: bool,
}

impl SectionIndex {
    /// `line_count` must be the final count, so entries can be pre-sized;
    /// the line index therefore has to be complete before classification
    /// starts.
    pub fn new(markers: MarkerSet, line_count: usize) -> Self {
        Self {
            markers,
            entries: vec![Entry::default(); line_count],
            stack: Vec::new(),
            current_start: 0,
            current_type: 0,
            scanned_lines: 0,
            complete: false,
        }
    }

    /// Classifies at most `max_lines` further lines from `index`. Returns
    /// whether every line is now classified. A failing call (unbalanced
    /// marker, line not yet available) leaves all prior state unchanged and
    /// resumable.
    pub fn advance(&mut self, max_lines: usize, index: &LineIndex) -> Result<bool> {
        if self.complete {
            return Ok(true);
        }

        let stop = self
            .entries
            .len()
            .min(self.scanned_lines.saturating_add(max_lines));
        while self.scanned_lines < stop {
            let line = self.scanned_lines;
            self.classify_line(line, index.line(line)?)?;
            self.scanned_lines += 1;
        }

        if self.scanned_lines == self.entries.len() {
            self.force_close();
            self.complete = true;
        }
        Ok(self.complete)
    }

    fn classify_line(&mut self, line: usize, text: &[u8]) -> Result<()> {
        // Start patterns win over end patterns on the same line; within each
        // group, table order is the tie-break.
        if let Some(type_id) = self.markers.first_start_match(text) {
            self.stack.push((self.current_start, self.current_type));
            self.current_start = line;
            self.current_type = type_id;
        } else if let Some(type_id) = self.markers.first_end_match(text) {
            // Strict nesting: an end marker must close the innermost open
            // section, never an outer level.
            if type_id != self.current_type {
                return Err(Error::UnbalancedMarker {
                    line,
                    found: self.markers.name(type_id).to_string(),
                    open: self.open_name().to_string(),
                });
            }
            self.entries[self.current_start] = Entry {
                type_id: self.current_type,
                line: line + 1,
            };
            let (start, type_id) = self.stack.pop().unwrap_or((0, 0));
            self.current_start = start;
            self.current_type = type_id;
        }

        // The end-marker line itself lands here with the parent context
        // already restored; its span still covers it (end is L + 1).
        self.entries[line] = Entry {
            type_id: self.current_type,
            line: self.current_start,
        };
        Ok(())
    }

    /// Resolves every level still open at end of input to the total line
    /// count, innermost first.
    fn force_close(&mut self) {
        let line_count = self.entries.len();
        if self.current_type != 0 {
            self.entries[self.current_start] = Entry {
                type_id: self.current_type,
                line: line_count,
            };
        }
        while let Some((start, type_id)) = self.stack.pop() {
            if type_id != 0 {
                self.entries[start] = Entry {
                    type_id,
                    line: line_count,
                };
            }
        }
        self.current_start = 0;
        self.current_type = 0;
    }

    fn open_name(&self) -> &str {
        if self.current_type == 0 {
            "top level"
        } else {
            self.markers.name(self.current_type)
        }
    }

    /// The innermost section enclosing `line`, or `None` at top level.
    /// Meaningful for lines below [`scanned_lines`](Self::scanned_lines)
    /// once classification is complete.
    pub fn resolve(&self, line: usize) -> Result<Option<SectionSpan>> {
        let entry = self
            .entries
            .get(line)
            .copied()
            .ok_or(Error::OutOfRange {
                line,
                count: self.entries.len(),
            })?;
        if entry.type_id == 0 {
            return Ok(None);
        }
        let (start, end) = if entry.line > line {
            // This is a start line; its patched entry holds the end directly.
            (line, entry.line)
        } else {
            // Back-pointer: one indirection through the start line.
            (entry.line, self.entries[entry.line].line)
        };
        Ok(Some(SectionSpan {
            name: self.markers.name(entry.type_id).to_string(),
            type_id: entry.type_id,
            start,
            end,
        }))
    }

    /// All sections in start-line order. Walks every entry, so intended for
    /// presentation after classification completes.
    pub fn spans(&self) -> Vec<SectionSpan> {
        (0..self.entries.len())
            .filter_map(|line| {
                let entry = self.entries[line];
                // Only patched start-line entries point past themselves.
                (entry.type_id != 0 && entry.line > line).then(|| SectionSpan {
                    name: self.markers.name(entry.type_id).to_string(),
                    type_id: entry.type_id,
                    start: line,
                    end: entry.line,
                })
            })
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    pub fn scanned_lines(&self) -> usize {
        self.scanned_lines
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ByteSource;

    fn marker(name: &str, start: &str, end: &str) -> Marker {
        Marker {
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    fn indexed(data: &[u8]) -> LineIndex {
        let mut index = LineIndex::new(ByteSource::from(data));
        assert!(index.advance(usize::MAX));
        index
    }

    fn classified(data: &[u8], markers: &[Marker]) -> SectionIndex {
        let index = indexed(data);
        let set = MarkerSet::compile(markers).unwrap();
        let mut sections = SectionIndex::new(set, index.line_count());
        assert!(sections.advance(usize::MAX, &index).unwrap());
        sections
    }

    fn setup_markers() -> Vec<Marker> {
        vec![marker("setup", r"^START setup", r"^END setup")]
    }

    #[test]
    fn test_single_section() {
        let sections = classified(b"START setup\na\nEND setup\nb\n", &setup_markers());

        let span = sections.resolve(0).unwrap().unwrap();
        assert_eq!(span.name, "setup");
        assert_eq!(span.start, 0);
        assert_eq!(span.end, 3);

        assert_eq!(sections.resolve(1).unwrap().unwrap(), span);
        assert_eq!(sections.resolve(3).unwrap(), None);
    }

    #[test]
    fn test_end_marker_line_belongs_to_parent_context() {
        let sections = classified(b"START setup\na\nEND setup\nb\n", &setup_markers());
        // The END line is recorded under the restored (top-level) context
        // even though the closed span's exclusive end still covers it.
        assert_eq!(sections.resolve(2).unwrap(), None);
    }

    #[test]
    fn test_nested_sections_resolve_to_innermost() {
        let markers = vec![
            marker("outer", r"^BEGIN outer", r"^FINISH outer"),
            marker("inner", r"^BEGIN inner", r"^FINISH inner"),
        ];
        let data = b"BEGIN outer\nBEGIN inner\nx\nFINISH inner\ny\nFINISH outer\ntail\n";
        let sections = classified(data, &markers);

        let inner = sections.resolve(2).unwrap().unwrap();
        assert_eq!(inner.name, "inner");
        assert_eq!((inner.start, inner.end), (1, 4));

        let outer = sections.resolve(4).unwrap().unwrap();
        assert_eq!(outer.name, "outer");
        assert_eq!((outer.start, outer.end), (0, 6));

        // Start lines resolve to their own section.
        assert_eq!(sections.resolve(1).unwrap().unwrap().name, "inner");
        assert_eq!(sections.resolve(0).unwrap().unwrap().name, "outer");

        assert_eq!(sections.resolve(6).unwrap(), None);
    }

    #[test]
    fn test_siblings_do_not_overlap() {
        let data = b"START setup\na\nEND setup\nSTART setup\nb\nEND setup\n";
        let sections = classified(data, &setup_markers());

        let spans = sections.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 3));
        assert_eq!((spans[1].start, spans[1].end), (3, 6));
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_unterminated_sections_force_closed_at_eof() {
        let markers = vec![
            marker("outer", r"^BEGIN outer", r"^FINISH outer"),
            marker("inner", r"^BEGIN inner", r"^FINISH inner"),
        ];
        let data = b"BEGIN outer\nBEGIN inner\ndangling\n";
        let sections = classified(data, &markers);

        let inner = sections.resolve(2).unwrap().unwrap();
        assert_eq!(inner.name, "inner");
        assert_eq!((inner.start, inner.end), (1, 3));

        let outer = sections.resolve(0).unwrap().unwrap();
        assert_eq!(outer.name, "outer");
        assert_eq!((outer.start, outer.end), (0, 3));
    }

    #[test]
    fn test_unbalanced_marker_is_fatal() {
        let markers = vec![
            marker("setup", r"^START setup", r"^END setup"),
            marker("teardown", r"^START teardown", r"^END teardown"),
        ];
        let index = indexed(b"START setup\nEND teardown\n");
        let set = MarkerSet::compile(&markers).unwrap();
        let mut sections = SectionIndex::new(set, index.line_count());

        match sections.advance(usize::MAX, &index) {
            Err(Error::UnbalancedMarker { line, found, open }) => {
                assert_eq!(line, 1);
                assert_eq!(found, "teardown");
                assert_eq!(open, "setup");
            }
            other => panic!("expected UnbalancedMarker, got {other:?}"),
        }
        // The failing line was not consumed; prior state is intact.
        assert_eq!(sections.scanned_lines(), 1);
        assert!(!sections.is_complete());
    }

    #[test]
    fn test_end_marker_at_top_level_is_unbalanced() {
        let index = indexed(b"END setup\n");
        let set = MarkerSet::compile(&setup_markers()).unwrap();
        let mut sections = SectionIndex::new(set, index.line_count());

        match sections.advance(usize::MAX, &index) {
            Err(Error::UnbalancedMarker { line, found, open }) => {
                assert_eq!(line, 0);
                assert_eq!(found, "setup");
                assert_eq!(open, "top level");
            }
            other => panic!("expected UnbalancedMarker, got {other:?}"),
        }
    }

    #[test]
    fn test_start_wins_over_end_on_same_line() {
        // Both patterns match this line; the start check runs first.
        let markers = vec![marker("block", r"MARK", r"MARK")];
        let sections = classified(b"MARK\nx\nMARK\n", &markers);

        // Line 0 opens; line 2 also matches start first, opening a nested
        // block rather than closing. Both get force-closed at EOF.
        let outer = sections.resolve(0).unwrap().unwrap();
        assert_eq!((outer.start, outer.end), (0, 3));
        let nested = sections.resolve(2).unwrap().unwrap();
        assert_eq!((nested.start, nested.end), (2, 3));
    }

    #[test]
    fn test_table_order_breaks_start_ties() {
        let markers = vec![
            marker("first", r"^GO", r"^STOP first"),
            marker("second", r"^GO", r"^STOP second"),
        ];
        let sections = classified(b"GO\nSTOP first\n", &markers);
        assert_eq!(sections.resolve(0).unwrap().unwrap().name, "first");
    }

    #[test]
    fn test_markers_match_anywhere_in_line() {
        // search semantics: the pattern need not anchor the whole line
        let markers = vec![marker("setup", r"START setup", r"END setup")];
        let sections = classified(b"12:00:01 START setup now\nwork\n12:00:09 END setup ok\n", &markers);
        let span = sections.resolve(1).unwrap().unwrap();
        assert_eq!((span.start, span.end), (0, 3));
    }

    #[test]
    fn test_resumable_one_line_at_a_time() {
        let data = b"BEGIN outer\nBEGIN inner\nx\nFINISH inner\ny\nFINISH outer\n";
        let markers = vec![
            marker("outer", r"^BEGIN outer", r"^FINISH outer"),
            marker("inner", r"^BEGIN inner", r"^FINISH inner"),
        ];
        let reference = classified(data, &markers);

        let index = indexed(data);
        let set = MarkerSet::compile(&markers).unwrap();
        let mut sections = SectionIndex::new(set, index.line_count());
        let mut ticks = 0;
        while !sections.advance(1, &index).unwrap() {
            ticks += 1;
            assert!(ticks <= index.line_count());
        }
        for line in 0..index.line_count() {
            assert_eq!(
                sections.resolve(line).unwrap(),
                reference.resolve(line).unwrap()
            );
        }
    }

    #[test]
    fn test_zero_lines_completes_immediately() {
        let index = indexed(b"");
        let set = MarkerSet::compile(&setup_markers()).unwrap();
        let mut sections = SectionIndex::new(set, index.line_count());
        assert!(sections.advance(usize::MAX, &index).unwrap());
        assert_eq!(sections.spans(), vec![]);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let sections = classified(b"a\n", &setup_markers());
        match sections.resolve(5) {
            Err(Error::OutOfRange { line: 5, count: 1 }) => {}
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_regex_fails_compile() {
        let markers = vec![marker("bad", r"[unclosed", r"^END")];
        match MarkerSet::compile(&markers) {
            Err(Error::InvalidPattern { name, .. }) => assert_eq!(name, "bad"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_marker_set_is_debug_formattable() {
        // Compile results get formatted in failure paths; keep that working.
        let set = MarkerSet::compile(&setup_markers()).unwrap();
        let dump = format!("{set:?}");
        assert!(dump.contains("setup"));
    }

    #[test]
    fn test_non_utf8_lines_still_match() {
        let markers = vec![marker("blob", r"START", r"END")];
        let data = b"START\n\xff\xfe\x00garbage\nEND\n";
        let sections = classified(data, &markers);
        let span = sections.resolve(1).unwrap().unwrap();
        assert_eq!((span.start, span.end), (0, 3));
    }
}
