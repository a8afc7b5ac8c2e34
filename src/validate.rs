//! Parse validation for edited documents.
//!
//! Operator templates are often malformed to begin with, so an edit is only
//! rejected when it makes things worse: after editing, re-parse with
//! tree-sitter and roll back if there are more ERROR/MISSING nodes than
//! before. Error positions move with every edit, so counts are compared
//! rather than positions.

use crate::html::{HtmlError, HtmlParser, ParsedHtml};
use std::path::Path;
use thiserror::Error;

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("parse errors present: found {count} ERROR nodes")]
    ParseErrors {
        count: usize,
        errors: Vec<ErrorLocation>,
    },

    #[error("parse error introduced: {introduced} new ERROR nodes")]
    ParseErrorIntroduced {
        introduced: usize,
        errors: Vec<ErrorLocation>,
    },

    #[error("HTML parser error: {0}")]
    Html(#[from] HtmlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Location of an error node in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub byte_start: usize,
    pub byte_end: usize,
    pub line: usize,
    pub column: usize,
    pub context: String,
}

/// Parse validator using tree-sitter.
pub struct ParseValidator {
    parser: HtmlParser,
}

impl ParseValidator {
    pub fn new() -> Result<Self, HtmlError> {
        Ok(Self {
            parser: HtmlParser::new()?,
        })
    }

    /// Validate that a document has no parse errors.
    pub fn validate(&mut self, source: &str) -> Result<(), ValidationError> {
        let parsed = self.parser.parse_with_source(source)?;
        check_clean(&parsed)
    }

    pub fn validate_file(&mut self, path: impl AsRef<Path>) -> Result<(), ValidationError> {
        let source = std::fs::read_to_string(path)?;
        self.validate(&source)
    }

    /// Check that `edited` has no more parse errors than `original`.
    pub fn validate_edit(&mut self, original: &str, edited: &str) -> Result<(), ValidationError> {
        let before = self.parser.parse_with_source(original)?.error_nodes().len();
        let after = self.parser.parse_with_source(edited)?;
        check_not_worse(before, &after)
    }
}

/// Validation through the thread-local parser pool.
pub mod pooled {
    use super::*;
    use crate::pool;

    pub fn validate(source: &str) -> Result<(), ValidationError> {
        pool::with_parser(|parser| -> Result<(), ValidationError> {
            let parsed = parser.parse_with_source(source)?;
            check_clean(&parsed)
        })?
    }

    pub fn validate_edit(original: &str, edited: &str) -> Result<(), ValidationError> {
        pool::with_parser(|parser| -> Result<(), ValidationError> {
            let before = parser.parse_with_source(original)?.error_nodes().len();
            let after = parser.parse_with_source(edited)?;
            check_not_worse(before, &after)
        })?
    }
}

fn check_clean(parsed: &ParsedHtml<'_>) -> Result<(), ValidationError> {
    if !parsed.has_errors() {
        return Ok(());
    }

    let errors = error_locations(parsed);
    Err(ValidationError::ParseErrors {
        count: errors.len(),
        errors,
    })
}

fn check_not_worse(before: usize, after: &ParsedHtml<'_>) -> Result<(), ValidationError> {
    let errors = error_locations(after);
    if errors.len() <= before {
        return Ok(());
    }

    Err(ValidationError::ParseErrorIntroduced {
        introduced: errors.len() - before,
        errors,
    })
}

/// Error nodes with line/column and a little surrounding text.
pub fn error_locations(parsed: &ParsedHtml<'_>) -> Vec<ErrorLocation> {
    let source = parsed.source;
    parsed
        .error_nodes()
        .into_iter()
        .map(|node| {
            let context_start = floor_boundary(source, node.byte_start.saturating_sub(20));
            let context_end = ceil_boundary(source, (node.byte_end + 20).min(source.len()));
            let context = source
                .get(context_start..context_end)
                .unwrap_or("")
                .replace('\n', "\\n");

            ErrorLocation {
                byte_start: node.byte_start,
                byte_end: node.byte_end,
                line: node.start_point.row + 1,
                column: node.start_point.column + 1,
                context,
            }
        })
        .collect()
}

fn floor_boundary(s: &str, mut at: usize) -> usize {
    while at > 0 && !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn ceil_boundary(s: &str, mut at: usize) -> usize {
    while at < s.len() && !s.is_char_boundary(at) {
        at += 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_document_passes() {
        let mut validator = ParseValidator::new().unwrap();
        assert!(validator
            .validate("<html><body><p>ok</p></body></html>")
            .is_ok());
    }

    #[test]
    fn rejects_edit_that_breaks_markup() {
        let original = "<div><p class=\"a\">ok</p></div>";
        let edited = "<div><p class=\"a>ok</p></div>";
        assert!(matches!(
            pooled::validate_edit(original, edited),
            Err(ValidationError::ParseErrorIntroduced { .. })
        ));
    }

    #[test]
    fn allows_edit_of_already_broken_document() {
        let original = "<div><p class=\"a>ok</p></div>";
        let edited = "<div><p class=\"a>fine</p></div>";
        assert!(pooled::validate_edit(original, edited).is_ok());
    }

    #[test]
    fn accepts_unchanged_input() {
        let source = "<table><tr><td>x</td></tr></table>";
        assert!(pooled::validate_edit(source, source).is_ok());
    }
}
