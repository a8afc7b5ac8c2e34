//! Inline `style` attribute declarations.
//!
//! Declarations keep their source order. Only properties that are set or
//! removed change; the attribute is re-rendered only when something did.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
    dirty: bool,
}

impl InlineStyle {
    pub fn parse(text: &str) -> Self {
        let declarations = split_declarations(text)
            .into_iter()
            .filter_map(|decl| {
                let (property, value) = decl.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                if property.is_empty() {
                    return None;
                }
                Some(Declaration {
                    property,
                    value: value.trim().to_string(),
                })
            })
            .collect();

        Self {
            declarations,
            dirty: false,
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property.eq_ignore_ascii_case(property))
            .map(|d| d.value.as_str())
    }

    /// Set a property. An empty value removes it, like assigning `""` through CSSOM.
    pub fn set(&mut self, property: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.remove(property);
            return;
        }

        match self
            .declarations
            .iter_mut()
            .find(|d| d.property.eq_ignore_ascii_case(property))
        {
            Some(decl) if decl.value == value => {}
            Some(decl) => {
                decl.value = value.to_string();
                self.dirty = true;
            }
            None => {
                self.declarations.push(Declaration {
                    property: property.to_ascii_lowercase(),
                    value: value.to_string(),
                });
                self.dirty = true;
            }
        }
    }

    pub fn remove(&mut self, property: &str) {
        let before = self.declarations.len();
        self.declarations
            .retain(|d| !d.property.eq_ignore_ascii_case(property));
        if self.declarations.len() != before {
            self.dirty = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Whether any `set`/`remove` changed the declarations.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", decl.property, decl.value)?;
        }
        Ok(())
    }
}

/// Split on `;` outside parentheses and quotes (`url(a;b)`, `"a;b"`).
fn split_declarations(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}
