use crate::address::{resolve, Address};
use crate::html::HtmlError;
use crate::mutation::applicator::{apply_fields, Applied};
use crate::mutation::errors::{MutationError, UnsupportedField};
use crate::mutation::fields::ElementEdit;
use crate::pool;
use crate::validate;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Roll back edits that add parse errors to the document
    pub validate_output: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            validate_output: true,
        }
    }
}

/// Result of one `apply` call. `html` is always a complete document.
#[derive(Debug)]
#[must_use = "MutationOutcome carries the edited document"]
pub struct MutationOutcome {
    pub html: String,
    pub status: MutationStatus,
    /// Fields skipped because they do not apply to the target's tag
    pub ignored: Vec<UnsupportedField>,
}

#[derive(Debug)]
pub enum MutationStatus {
    Applied {
        /// The target was only found through the wrapper-link retry
        recovered: bool,
        /// Address of the edited element in the returned document
        address: Option<Address>,
    },
    /// The target resolved but nothing in the document changed
    Unchanged,
    /// The document was left as it was
    Failed(MutationError),
}

impl MutationOutcome {
    fn failed(html: &str, error: MutationError) -> Self {
        warn!(%error, "edit not applied");
        Self {
            html: html.to_string(),
            status: MutationStatus::Failed(error),
            ignored: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.status, MutationStatus::Applied { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, MutationStatus::Failed(_))
    }

    pub fn error(&self) -> Option<&MutationError> {
        match &self.status {
            MutationStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Where the edited element lives now, if it moved or was re-encoded.
    pub fn address(&self) -> Option<&Address> {
        match &self.status {
            MutationStatus::Applied { address, .. } => address.as_ref(),
            _ => None,
        }
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// Parses, resolves, edits and re-serializes documents.
///
/// Holds no document state: every call starts from the text it is given.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Apply `edit` to the element named by `address`.
    ///
    /// Never fails past this boundary: on any error the original text comes
    /// back with [`MutationStatus::Failed`].
    pub fn apply(&self, html: &str, address: &str, edit: &ElementEdit) -> MutationOutcome {
        match address.parse::<Address>() {
            Ok(address) => self.apply_at(html, &address, edit),
            Err(error) => MutationOutcome::failed(html, error.into()),
        }
    }

    pub fn apply_at(&self, html: &str, address: &Address, edit: &ElementEdit) -> MutationOutcome {
        let (anchor, recovered) = match locate(html, address) {
            Ok(found) => found,
            Err(error) => return MutationOutcome::failed(html, error),
        };

        if edit.is_empty() {
            return MutationOutcome {
                html: html.to_string(),
                status: MutationStatus::Unchanged,
                ignored: Vec::new(),
            };
        }

        let Applied {
            html: edited,
            anchor,
            ignored,
        } = match apply_fields(html, anchor, edit) {
            Ok(applied) => applied,
            Err(error) => return MutationOutcome::failed(html, error),
        };

        if edited == html {
            return MutationOutcome {
                html: edited,
                status: MutationStatus::Unchanged,
                ignored,
            };
        }

        if self.options.validate_output {
            if let Err(error) = validate::pooled::validate_edit(html, &edited) {
                return MutationOutcome::failed(html, MutationError::MalformedResult(error));
            }
        }

        let address = encode_at(&edited, anchor);
        debug!(recovered, address = ?address.as_ref().map(ToString::to_string), "edit applied");

        MutationOutcome {
            html: edited,
            status: MutationStatus::Applied { recovered, address },
            ignored,
        }
    }
}

/// Apply with the default engine.
pub fn apply(html: &str, address: &str, edit: &ElementEdit) -> MutationOutcome {
    Engine::default().apply(html, address, edit)
}

/// Start offset of the resolved target and whether recovery was needed.
fn locate(html: &str, address: &Address) -> Result<(usize, bool), MutationError> {
    pool::with_parser(|parser| -> Result<(usize, bool), MutationError> {
        let parsed = parser.parse_with_source(html)?;
        let resolution = resolve(&parsed, address).ok_or_else(|| MutationError::Unresolved {
            address: address.to_string(),
        })?;
        Ok((resolution.element.start_byte(), resolution.recovered))
    })?
}

fn encode_at(html: &str, anchor: usize) -> Option<Address> {
    pool::with_parser(|parser| -> Result<Option<Address>, HtmlError> {
        let parsed = parser.parse_with_source(html)?;
        Ok(parsed
            .element_at(anchor)
            .map(|el| Address::encode(&el, &parsed.content_root())))
    })
    .ok()?
    .ok()?
}
