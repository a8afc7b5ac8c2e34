//! Boundary to an external text-rewriting service.
//!
//! The crate ships no client. A suggestion is just a value that becomes an
//! ordinary text or `alt` edit.

use crate::mutation::ElementEdit;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiAction {
    RewriteFriendly,
    RewriteProfessional,
    Shorten,
    FixGrammar,
    GenerateAlt,
}

impl AiAction {
    pub const ALL: [AiAction; 5] = [
        AiAction::RewriteFriendly,
        AiAction::RewriteProfessional,
        AiAction::Shorten,
        AiAction::FixGrammar,
        AiAction::GenerateAlt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::RewriteFriendly => "rewrite-friendly",
            AiAction::RewriteProfessional => "rewrite-professional",
            AiAction::Shorten => "shorten",
            AiAction::FixGrammar => "fix-grammar",
            AiAction::GenerateAlt => "generate-alt",
        }
    }

    /// The edit a suggestion for this action turns into.
    pub fn into_edit(self, suggestion: String) -> ElementEdit {
        match self {
            AiAction::GenerateAlt => ElementEdit {
                alt: Some(suggestion),
                ..ElementEdit::default()
            },
            _ => ElementEdit {
                text: Some(suggestion),
                ..ElementEdit::default()
            },
        }
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        AiAction::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| format!("unknown action: {s}"))
    }
}

/// Produces rewritten text for an action.
pub trait Rewriter {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `context` describes what the text belongs to (e.g. an image).
    fn rewrite(
        &self,
        text: &str,
        action: AiAction,
        context: Option<&str>,
    ) -> Result<String, Self::Error>;
}

impl<F> Rewriter for F
where
    F: Fn(&str, AiAction, Option<&str>) -> String,
{
    type Error = Infallible;

    fn rewrite(
        &self,
        text: &str,
        action: AiAction,
        context: Option<&str>,
    ) -> Result<String, Self::Error> {
        Ok(self(text, action, context))
    }
}
