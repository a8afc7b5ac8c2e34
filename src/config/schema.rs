use crate::address::Address;
use crate::html::is_valid_tag_name;
use crate::mutation::ElementEdit;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// A sequence of edits applied to a template, in order.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditScript {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub edits: Vec<ScriptEdit>,
}

impl EditScript {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        let mut seen = HashSet::new();
        for edit in &self.edits {
            let edit_id = (!edit.id.trim().is_empty()).then(|| edit.id.clone());

            if edit_id.is_none() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !seen.insert(edit.id.as_str()) {
                issues.push(ValidationIssue::InvalidValue {
                    edit_id: edit_id.clone(),
                    message: "duplicate edit id".to_string(),
                });
            }

            if let Err(error) = edit.address.parse::<Address>() {
                issues.push(ValidationIssue::InvalidValue {
                    edit_id: edit_id.clone(),
                    message: error.to_string(),
                });
            }

            if edit.set.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: edit_id.clone(),
                    field: "set",
                });
            }

            if let Some(tag) = &edit.set.tag_name {
                if !is_valid_tag_name(tag.trim()) {
                    issues.push(ValidationIssue::InvalidValue {
                        edit_id: edit_id.clone(),
                        message: format!("invalid tag name {tag:?}"),
                    });
                }
            }

            if let Some(scale) = edit.set.scale {
                if !scale.is_finite() || scale <= 0.0 {
                    issues.push(ValidationIssue::InvalidValue {
                        edit_id: edit_id.clone(),
                        message: format!("scale must be positive, got {scale}"),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Roll back edits that add parse errors
    #[serde(default = "default_true")]
    pub validate_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            validate_output: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScriptEdit {
    pub id: String,
    #[serde(default)]
    pub address: String,
    /// Fields to change, in the camelCase edit format
    #[serde(default)]
    pub set: ElementEdit,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    InvalidValue {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit script contains no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' missing required field '{field}'"),
                None => write!(f, "edit missing required field '{field}'"),
            },
            ValidationIssue::InvalidValue { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' is invalid: {message}"),
                None => write!(f, "invalid edit: {message}"),
            },
        }
    }
}
