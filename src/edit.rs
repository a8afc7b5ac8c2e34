use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every document mutation (tag morphs, attribute writes, link wrapping, style
/// changes) compiles down to this primitive. Intelligence lives in locating the
/// span, not in applying it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at {byte_start}..{byte_end}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        expected: String,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in buffer of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("byte range [{byte_start}, {byte_end}) splits a UTF-8 character")]
    NotCharBoundary { byte_start: usize, byte_end: usize },

    #[error("overlapping edits at byte {at}")]
    Overlap { at: usize },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl Into<String>,
    ) -> Self {
        let expected = expected_before.into();
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(&expected),
        }
    }

    /// Insert `text` at `offset` without replacing anything.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, offset, text, "")
    }

    /// Replace the span of `source` at `range`, recording its current text for verification.
    pub fn replace(source: &str, range: std::ops::Range<usize>, text: impl Into<String>) -> Self {
        let before = source.get(range.clone()).unwrap_or_default();
        Self::new(range.start, range.end, text, before)
    }

    /// Net change in buffer length once applied.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - (self.byte_end - self.byte_start) as isize
    }

    /// The single replacement that turns `before` into `after`.
    ///
    /// Covers the span between their longest common prefix and suffix, so
    /// offsets outside it map straight across with [`map_offset`]. `None`
    /// when the texts are equal.
    pub fn between(before: &str, after: &str) -> Option<Self> {
        if before == after {
            return None;
        }

        let (a, b) = (before.as_bytes(), after.as_bytes());
        let mut prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
        while !(before.is_char_boundary(prefix) && after.is_char_boundary(prefix)) {
            prefix -= 1;
        }

        let room = a.len().min(b.len()) - prefix;
        let mut suffix = a
            .iter()
            .rev()
            .zip(b.iter().rev())
            .take(room)
            .take_while(|(x, y)| x == y)
            .count();
        while !(before.is_char_boundary(a.len() - suffix)
            && after.is_char_boundary(b.len() - suffix))
        {
            suffix -= 1;
        }

        Some(Self::replace(
            before,
            prefix..a.len() - suffix,
            &after[prefix..b.len() - suffix],
        ))
    }

    /// Validate the edit against the current buffer.
    ///
    /// Returns the current text at [byte_start, byte_end) if validation succeeds.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }

        let current = content
            .get(self.byte_start..self.byte_end)
            .ok_or(EditError::NotCharBoundary {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
            })?;

        // Idempotency: already applied
        if current == self.new_text {
            return Ok(current);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                expected: format!("{:?}", self.expected_before),
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply multiple edits to one buffer in a single operation.
    ///
    /// Edits are sorted by byte_start descending and applied bottom-to-top
    /// to avoid offset invalidation. Either every edit applies or none does.
    pub fn apply_batch(content: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
        if edits.is_empty() {
            return Ok(content.to_string());
        }

        // Descending by start; for equal starts the wider span goes first so
        // a pure insertion at the same offset lands in front of it.
        edits.sort_by(|a, b| {
            b.byte_start
                .cmp(&a.byte_start)
                .then(b.byte_end.cmp(&a.byte_end))
        });

        for edit in &edits {
            edit.validate(content)?;
        }

        // For non-overlapping regions: earlier edit's end <= later edit's start
        for window in edits.windows(2) {
            let (later, earlier) = (&window[0], &window[1]);
            if earlier.byte_end > later.byte_start {
                return Err(EditError::Overlap {
                    at: later.byte_start,
                });
            }
        }

        let mut buffer = content.to_string();
        for edit in &edits {
            if buffer[edit.byte_start..edit.byte_end] == edit.new_text {
                continue;
            }
            buffer.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        }

        Ok(buffer)
    }
}

/// Map a byte offset in the original buffer through a batch of edits.
///
/// Edits that end at or before `offset` (including insertions exactly at it)
/// move the offset by their length delta.
pub fn map_offset(offset: usize, edits: &[Edit]) -> usize {
    let shift: isize = edits
        .iter()
        .filter(|edit| edit.byte_end <= offset)
        .map(Edit::delta)
        .sum();
    (offset as isize + shift).max(0) as usize
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the target is left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
