//! A selection session over one working document.
//!
//! Selecting an element snapshots the document. Edits made while the
//! selection is open go to the working copy; `cancel` puts the snapshot
//! back verbatim and `save` keeps the working copy.

use crate::address::{resolve, Address};
use crate::edit::{map_offset, Edit};
use crate::mutation::{Engine, ElementEdit, MutationError, MutationOutcome, MutationStatus};
use crate::pool;
use crate::selection::{extract, extract_at, DeclaredMetrics, RenderMetrics, SelectionDescriptor};
use crate::suggest::{AiAction, Rewriter};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// What `select` does when a selection is already open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPolicy {
    /// Restore the open selection's snapshot, then open the new one
    #[default]
    RestoreThenOpen,
    /// Keep the unsaved working copy and drop its snapshot
    Abandon,
    /// Refuse until the open selection is saved or cancelled
    RequireClose,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no element is selected")]
    NoSelection,

    #[error("selection {address} is still open; save or cancel it first")]
    SelectionOpen { address: String },

    #[error("address {address:?} does not name an element")]
    NotFound { address: String },

    #[error("edit failed: {0}")]
    Edit(#[from] MutationError),

    #[error("selected element has no text or image source to rewrite")]
    NothingToRewrite,

    #[error("rewriter failed: {0}")]
    Rewrite(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub struct EditSession {
    document: String,
    snapshot: Option<String>,
    selection: Option<SelectionDescriptor>,
    policy: SessionPolicy,
    engine: Engine,
    metrics: Box<dyn RenderMetrics>,
}

impl EditSession {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            snapshot: None,
            selection: None,
            policy: SessionPolicy::default(),
            engine: Engine::default(),
            metrics: Box::new(DeclaredMetrics),
        }
    }

    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_metrics(mut self, metrics: impl RenderMetrics + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    /// The working copy.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    pub fn selection(&self) -> Option<&SelectionDescriptor> {
        self.selection.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.selection.is_some()
    }

    /// Open a selection on the element at `address`.
    ///
    /// The address names an element of the working copy, the document the
    /// operator is looking at. Under [`SessionPolicy::RestoreThenOpen`] that
    /// element is then found again in the restored snapshot. Nothing changes
    /// when the address names no element.
    pub fn select(&mut self, address: &str) -> Result<&SelectionDescriptor, SessionError> {
        let not_found = || SessionError::NotFound {
            address: address.to_string(),
        };

        let restore = match (&self.selection, self.policy) {
            (Some(open), SessionPolicy::RequireClose) => {
                return Err(SessionError::SelectionOpen {
                    address: open.address.to_string(),
                });
            }
            (Some(_), SessionPolicy::RestoreThenOpen) => self
                .snapshot
                .clone()
                .filter(|snapshot| *snapshot != self.document),
            _ => None,
        };

        let found = match &restore {
            Some(snapshot) => {
                extract_restored(&self.document, snapshot, address, self.metrics.as_ref())
            }
            None => extract_at(&self.document, address, self.metrics.as_ref()),
        };
        let descriptor = found.ok_or_else(not_found)?;

        if let Some(open) = &self.selection {
            match (self.policy, restore) {
                (SessionPolicy::RestoreThenOpen, Some(snapshot)) => {
                    debug!(address = %open.address, "restoring snapshot before new selection");
                    self.document = snapshot;
                }
                (SessionPolicy::Abandon, _)
                    if self.snapshot.as_deref() != Some(self.document.as_str()) =>
                {
                    warn!(address = %open.address, "abandoning unsaved edits of previous selection");
                }
                _ => {}
            }
        }

        self.snapshot = Some(self.document.clone());
        Ok(self.selection.insert(descriptor))
    }

    /// Apply an edit to the selected element in the working copy.
    ///
    /// On failure the working copy is left as it was.
    pub fn update(&mut self, edit: &ElementEdit) -> Result<MutationOutcome, SessionError> {
        let selection = self.selection.as_mut().ok_or(SessionError::NoSelection)?;
        let MutationOutcome {
            html,
            status,
            ignored,
        } = self
            .engine
            .apply_at(&self.document, &selection.address, edit);

        match status {
            MutationStatus::Failed(error) => return Err(SessionError::Edit(error)),
            MutationStatus::Applied { ref address, .. } => {
                if let Some(address) = address {
                    selection.address = address.clone();
                }
                self.document = html.clone();
            }
            MutationStatus::Unchanged => {}
        }

        selection.merge(edit);
        Ok(MutationOutcome {
            html,
            status,
            ignored,
        })
    }

    /// Keep the working copy and close the selection.
    pub fn save(&mut self) -> &str {
        self.snapshot = None;
        self.selection = None;
        &self.document
    }

    /// Restore the snapshot and close the selection.
    pub fn cancel(&mut self) -> &str {
        if let Some(snapshot) = self.snapshot.take() {
            self.document = snapshot;
        }
        self.selection = None;
        &self.document
    }

    /// Ask `rewriter` for a suggestion and apply it to the selection.
    ///
    /// Image alt text is generated from the `src` when there is no text.
    pub fn apply_suggestion<R: Rewriter>(
        &mut self,
        action: AiAction,
        rewriter: &R,
    ) -> Result<MutationOutcome, SessionError> {
        let selection = self.selection.as_ref().ok_or(SessionError::NoSelection)?;

        let content = Some(selection.text.as_str())
            .filter(|t| !t.is_empty())
            .or(selection.src.as_deref().filter(|s| !s.is_empty()))
            .ok_or(SessionError::NothingToRewrite)?;
        let context = selection.is_image().then_some("Image in email template");

        let suggestion = rewriter
            .rewrite(content, action, context)
            .map_err(|e| SessionError::Rewrite(Box::new(e)))?;

        self.update(&action.into_edit(suggestion))
    }
}

/// Resolve `address` in `working` and read the same element from `snapshot`.
///
/// Offsets outside the span where the two texts differ map straight across.
/// An element created inside that span (a wrapper link, say) has no
/// counterpart, so its nearest ancestor that does is selected instead.
fn extract_restored(
    working: &str,
    snapshot: &str,
    address: &str,
    metrics: &dyn RenderMetrics,
) -> Option<SelectionDescriptor> {
    let address: Address = address.parse().ok()?;
    let diff = Edit::between(working, snapshot)?;

    pool::with_parser(|parser| -> Option<SelectionDescriptor> {
        let current = parser.parse_with_source(working).ok()?;
        let restored = parser.parse_with_source(snapshot).ok()?;
        let clicked = resolve(&current, &address)?.element;

        let mut candidate = Some(clicked);
        while let Some(element) = candidate {
            let offset = element.start_byte();
            if offset < diff.byte_start || offset >= diff.byte_end {
                let mapped = map_offset(offset, std::slice::from_ref(&diff));
                if let Some(found) = restored.element_at(mapped) {
                    let canonical = Address::encode(&found, &restored.content_root());
                    return Some(extract(&found, canonical, metrics));
                }
            }
            candidate = element.parent();
        }
        None
    })
    .ok()
    .flatten()
}
