use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A line lookup outside the currently discovered range. Never clamped;
    /// callers that poll incrementally must track scan progress themselves.
    #[error("line {line} out of range ({count} lines discovered)")]
    OutOfRange { line: usize, count: usize },

    /// An end marker that does not close the innermost open section.
    #[error("unbalanced marker on line {line}: end pattern for `{found}` while `{open}` is open")]
    UnbalancedMarker {
        line: usize,
        found: String,
        open: String,
    },

    #[error("invalid regex for marker `{name}`: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A resolved section for one line: which marker pair encloses it and the
/// half-open line range the pair delimits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSpan {
    pub name: String,
    /// 1-based position in the marker table; 0 is reserved for "no section"
    /// and never appears in a resolved span.
    pub type_id: usize,
    pub start: usize,
    /// Exclusive. Equal to the total line count for sections still open at
    /// end of input.
    pub end: usize,
}
