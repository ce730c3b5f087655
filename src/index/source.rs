use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use crate::types::Result;

/// Read-only, randomly-addressable view over a file's raw contents.
///
/// Real files are memory-mapped so multi-gigabyte inputs never get copied
/// into the heap. Zero-length files (mapping a length of 0 is not legal) and
/// in-memory test inputs use an owned buffer instead; both backings look the
/// same to the index.
pub enum ByteSource {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl ByteSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(ByteSource::Owned(Vec::new()));
        }
        // Safety: the map is read-only and the file is treated as immutable
        // for the lifetime of the session (no live tailing).
        let map = unsafe { Mmap::map(&file)? };
        Ok(ByteSource::Mapped(map))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ByteSource::Mapped(map) => map,
            ByteSource::Owned(buf) => buf,
        }
    }
}

impl Deref for ByteSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(buf: Vec<u8>) -> Self {
        ByteSource::Owned(buf)
    }
}

impl From<&[u8]> for ByteSource {
    fn from(bytes: &[u8]) -> Self {
        ByteSource::Owned(bytes.to_vec())
    }
}
