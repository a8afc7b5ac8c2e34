use crate::address::AddressError;
use crate::edit::EditError;
use crate::html::HtmlError;
use crate::validate::ValidationError;
use thiserror::Error;

/// Why an edit left the document unchanged.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] HtmlError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("address {address} does not name an element")]
    Unresolved { address: String },

    #[error("invalid tag name: {name:?}")]
    InvalidTagName { name: String },

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("edited element no longer found at byte {offset}")]
    TargetLost { offset: usize },

    #[error("edit failed: {0}")]
    Edit(#[from] EditError),

    #[error("edit would produce malformed markup: {0}")]
    MalformedResult(#[source] ValidationError),
}

/// A field that does not apply to the target's tag.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UnsupportedField {
    pub field: &'static str,
    /// Lowercase tag of the target
    pub tag: String,
}

impl std::fmt::Display for UnsupportedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not supported on <{}>", self.field, self.tag)
    }
}
