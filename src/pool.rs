//! Thread-local parser pooling.
//!
//! Every `apply` re-parses the document, often several times (one parse per
//! edit step plus output validation). The pool keeps one HTML parser per
//! thread and reuses it across calls.

use crate::html::{HtmlError, HtmlParser};
use std::cell::RefCell;

thread_local! {
    static HTML_PARSER: RefCell<Option<HtmlParser>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// The parser is created on first use per thread.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use prism_editor::pool::with_parser;
///
/// let has_errors = with_parser(|parser| {
///     parser
///         .parse_with_source("<p>hi</p>")
///         .map(|parsed| parsed.has_errors())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, HtmlError>
where
    F: FnOnce(&mut HtmlParser) -> R,
{
    HTML_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(HtmlParser::new()?);
        }
        Ok(f(slot.as_mut().expect("parser was just initialized above")))
    })
}
