//! Tree-sitter view of HTML documents.
//!
//! The parse tree is only used to locate spans. Documents are never
//! re-serialized from the tree: every change is a byte-span [`Edit`](crate::Edit)
//! on the original text, so markup outside the touched spans is preserved
//! exactly (comments, conditional comments, attribute quoting, whitespace).

pub mod element;
pub mod errors;
pub mod escape;
pub mod parser;
pub mod tag;

pub use element::{
    is_element_kind, is_valid_tag_name, is_void_element, AttributeRef, ElementRef,
};
pub use errors::HtmlError;
pub use escape::{escape_attr, escape_text, unescape};
pub use parser::{ContentRoot, ErrorNode, HtmlParser, ParsedHtml};
pub use tag::TagEditor;
