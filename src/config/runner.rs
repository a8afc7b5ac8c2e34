//! Script runner - applies an edit script to one template
//!
//! Edits run in order, each against the result of the previous one. A failed
//! edit leaves the document as it was and the run continues.

use crate::config::schema::{EditScript, ScriptEdit};
use crate::mutation::{Engine, EngineOptions, MutationStatus, UnsupportedField};
use std::fmt;
use tracing::debug;

/// Result of running a single scripted edit
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ScriptResult should be checked for success/failure"]
pub enum ScriptResult {
    /// Edit changed the document
    Applied {
        id: String,
        recovered: bool,
        ignored: Vec<UnsupportedField>,
    },
    /// Target already carried every requested value
    AlreadyApplied { id: String },
    /// Edit failed; the document is unchanged
    Failed { id: String, reason: String },
}

impl ScriptResult {
    pub fn id(&self) -> &str {
        match self {
            ScriptResult::Applied { id, .. }
            | ScriptResult::AlreadyApplied { id }
            | ScriptResult::Failed { id, .. } => id,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScriptResult::Failed { .. })
    }
}

impl fmt::Display for ScriptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptResult::Applied {
                id,
                recovered,
                ignored,
            } => {
                write!(f, "Applied {id}")?;
                if *recovered {
                    write!(f, " (through wrapper link)")?;
                }
                if !ignored.is_empty() {
                    let names: Vec<_> = ignored.iter().map(|u| u.field).collect();
                    write!(f, "; ignored {}", names.join(", "))?;
                }
                Ok(())
            }
            ScriptResult::AlreadyApplied { id } => write!(f, "Already applied {id}"),
            ScriptResult::Failed { id, reason } => write!(f, "Failed {id}: {reason}"),
        }
    }
}

/// The edited document and one result per scripted edit.
#[derive(Debug, Clone)]
pub struct ScriptReport {
    pub html: String,
    pub results: Vec<ScriptResult>,
}

impl ScriptReport {
    pub fn applied(&self) -> usize {
        self.count(|r| matches!(r, ScriptResult::Applied { .. }))
    }

    pub fn already_applied(&self) -> usize {
        self.count(|r| matches!(r, ScriptResult::AlreadyApplied { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(ScriptResult::is_failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&ScriptResult) -> bool) -> usize {
        self.results.iter().filter(|r| pred(r)).count()
    }
}

pub fn run_script(html: &str, script: &EditScript) -> ScriptReport {
    let engine = Engine::new(EngineOptions {
        validate_output: script.settings.validate_output,
    });

    let mut document = html.to_string();
    let mut results = Vec::with_capacity(script.edits.len());

    for edit in &script.edits {
        let (next, result) = run_edit(&engine, &document, edit);
        debug!(id = %edit.id, result = %result, "scripted edit finished");
        if let Some(next) = next {
            document = next;
        }
        results.push(result);
    }

    ScriptReport {
        html: document,
        results,
    }
}

fn run_edit(engine: &Engine, html: &str, edit: &ScriptEdit) -> (Option<String>, ScriptResult) {
    let id = edit.id.clone();
    let outcome = engine.apply(html, &edit.address, &edit.set);

    match outcome.status {
        MutationStatus::Applied { recovered, .. } => (
            Some(outcome.html),
            ScriptResult::Applied {
                id,
                recovered,
                ignored: outcome.ignored,
            },
        ),
        MutationStatus::Unchanged => (None, ScriptResult::AlreadyApplied { id }),
        MutationStatus::Failed(error) => (
            None,
            ScriptResult::Failed {
                id,
                reason: error.to_string(),
            },
        ),
    }
}
