//! Prism Editor: structural editing of HTML email templates
//!
//! Elements are named by a path-style [`Address`] and changed through typed
//! [`ElementEdit`]s. The document is parsed with tree-sitter on every call and
//! each change is applied as a byte-span [`Edit`], so everything outside the
//! edited tags comes back byte-for-byte as it went in.
//!
//! # Architecture
//!
//! - [`address`] encodes elements as addresses and resolves them back, with a
//!   one-shot retry for elements that were wrapped in a new link.
//! - [`mutation`] applies an edit and always returns a complete document.
//! - [`selection`] reads the editable state of one element.
//! - [`session`] keeps a working copy with snapshot, cancel and save.
//! - [`config`] loads edit scripts and runs them against a template.
//!
//! # Example
//!
//! ```
//! use prism_editor::{apply, ElementEdit};
//!
//! let html = "<html><body><p>Hello</p></body></html>";
//! let edit = ElementEdit {
//!     tag_name: Some("h1".into()),
//!     text: Some("Welcome".into()),
//!     ..ElementEdit::default()
//! };
//!
//! let outcome = apply(html, "/p[1]", &edit);
//! assert!(outcome.is_applied());
//! assert_eq!(outcome.html, "<html><body><h1>Welcome</h1></body></html>");
//! ```

pub mod address;
pub mod config;
pub mod edit;
pub mod html;
pub mod mutation;
pub mod pool;
pub mod selection;
pub mod session;
pub mod style;
pub mod suggest;
pub mod validate;

// Re-exports
pub use address::{resolve, Address, AddressError, Resolution, Step};
pub use config::{
    load_from_path, load_from_str, run_script, ConfigError, EditScript, ScriptReport, ScriptResult,
};
pub use edit::{Edit, EditError, EditVerification};
pub use html::{HtmlError, HtmlParser, ParsedHtml};
pub use mutation::{
    apply, ElementEdit, Engine, EngineOptions, FieldEdit, ImageFrame, MutationError,
    MutationOutcome, MutationStatus, ObjectFit, SizingMode, UnsupportedField,
};
pub use selection::{
    extract, extract_at, list_editable, DeclaredMetrics, EditableElement, MeasuredMetrics,
    RenderMetrics, SelectionDescriptor,
};
pub use session::{EditSession, SessionError, SessionPolicy};
pub use suggest::{AiAction, Rewriter};
pub use validate::{ErrorLocation, ParseValidator, ValidationError};
