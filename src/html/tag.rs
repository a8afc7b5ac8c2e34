//! Start-tag rewriting.
//!
//! A [`TagEditor`] holds the attributes of one start tag in source order.
//! Untouched attributes keep their original text (quotes, casing, spacing);
//! only attributes that are set are re-rendered, always double-quoted.

use crate::edit::Edit;
use crate::html::element::ElementRef;
use crate::html::escape::escape_attr;
use crate::style::InlineStyle;
use std::ops::Range;

#[derive(Debug, Clone)]
struct AttributeSlot {
    /// Whitespace in front of the attribute
    lead: String,
    name: String,
    value: Option<String>,
    /// Source text while the attribute is untouched
    raw: Option<String>,
    removed: bool,
}

impl AttributeSlot {
    fn render(&self, out: &mut String) {
        out.push_str(&self.lead);
        match (&self.raw, &self.value) {
            (Some(raw), _) => out.push_str(raw),
            (None, Some(value)) => {
                out.push_str(&self.name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            (None, None) => out.push_str(&self.name),
        }
    }
}

/// Editable view of one start tag.
#[derive(Debug, Clone)]
pub struct TagEditor {
    span: Range<usize>,
    original: String,
    open: String,
    name: String,
    slots: Vec<AttributeSlot>,
    close: String,
}

impl TagEditor {
    /// Build an editor for the element's start tag.
    ///
    /// Returns `None` for elements without a start tag (error recovery).
    pub fn new(element: &ElementRef<'_>) -> Option<Self> {
        let source = element.source();
        let tag = element.start_tag()?;
        let name_span = element.tag_name_span()?;

        let mut slots = Vec::new();
        let mut cursor = name_span.end;
        for attr in element.attributes() {
            slots.push(AttributeSlot {
                lead: source[cursor..attr.span.start].to_string(),
                name: attr.name,
                value: attr.value,
                raw: Some(source[attr.span.clone()].to_string()),
                removed: false,
            });
            cursor = attr.span.end;
        }

        Some(Self {
            span: tag.byte_range(),
            original: source[tag.byte_range()].to_string(),
            open: source[tag.start_byte()..name_span.start].to_string(),
            name: source[name_span].to_string(),
            slots,
            close: source[cursor..tag.end_byte()].to_string(),
        })
    }

    /// A new, empty start tag to be inserted at `offset`.
    pub fn insert_at(offset: usize, name: &str) -> Self {
        Self {
            span: offset..offset,
            original: String::new(),
            open: "<".to_string(),
            name: name.to_ascii_lowercase(),
            slots: Vec::new(),
            close: ">".to_string(),
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Turn a self-closing `/>` into a plain `>`.
    pub fn open_form(&mut self) {
        if let Some(rest) = self.close.strip_suffix("/>") {
            self.close = format!("{}>", rest.trim_end());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.slot(name).map(|s| s.value.as_deref().unwrap_or_default())
    }

    pub fn has(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// Set an attribute, appending it when absent. Setting the current value is a no-op.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| !s.removed && s.name.eq_ignore_ascii_case(name))
        {
            if slot.value.as_deref() != Some(value) {
                slot.value = Some(value.to_string());
                slot.raw = None;
            }
            return;
        }

        self.slots.push(AttributeSlot {
            lead: " ".to_string(),
            name: name.to_ascii_lowercase(),
            value: Some(value.to_string()),
            raw: None,
            removed: false,
        });
    }

    /// Remove every attribute with this name.
    pub fn remove(&mut self, name: &str) {
        for slot in &mut self.slots {
            if slot.name.eq_ignore_ascii_case(name) {
                slot.removed = true;
            }
        }
    }

    pub fn style(&self) -> InlineStyle {
        InlineStyle::parse(self.get("style").unwrap_or_default())
    }

    /// Write back a style edited through [`TagEditor::style`].
    pub fn set_style(&mut self, style: &InlineStyle) {
        if !style.is_dirty() {
            return;
        }
        if style.is_empty() {
            self.remove("style");
        } else {
            self.set("style", &style.to_string());
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.original.len() + 32);
        out.push_str(&self.open);
        out.push_str(&self.name);
        for slot in self.slots.iter().filter(|s| !s.removed) {
            slot.render(&mut out);
        }
        out.push_str(&self.close);
        out
    }

    /// The replacement edit for the start tag, or `None` when nothing changed.
    pub fn into_edit(self) -> Option<Edit> {
        let rendered = self.render();
        if rendered == self.original {
            return None;
        }
        Some(Edit::new(
            self.span.start,
            self.span.end,
            rendered,
            self.original,
        ))
    }

    fn slot(&self, name: &str) -> Option<&AttributeSlot> {
        self.slots
            .iter()
            .find(|s| !s.removed && s.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::HtmlParser;

    fn editor(source: &str) -> TagEditor {
        let mut parser = HtmlParser::new().unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        let element = parsed.elements()[0];
        TagEditor::new(&element).unwrap()
    }

    #[test]
    fn inserted_tag_renders_as_insertion() {
        let mut link = TagEditor::insert_at(4, "A");
        link.set("href", "x&y");
        let edit = link.into_edit().unwrap();
        assert_eq!((edit.byte_start, edit.byte_end), (4, 4));
        assert_eq!(edit.new_text, "<a href=\"x&amp;y\">");
        assert!(TagEditor::insert_at(0, "a").into_edit().is_some());
    }

    #[test]
    fn unchanged_tag_produces_no_edit() {
        let mut tag = editor("<img  SRC='a.png' alt=logo hidden>");
        tag.set("src", "a.png");
        assert!(tag.into_edit().is_none());
    }

    #[test]
    fn set_rewrites_only_the_touched_attribute() {
        let tag = {
            let mut tag = editor("<img  SRC='a.png' alt=logo hidden>");
            tag.set("alt", "Prism \"logo\"");
            tag
        };
        assert_eq!(
            tag.render(),
            "<img  SRC='a.png' alt=\"Prism &quot;logo&quot;\" hidden>"
        );
    }

    #[test]
    fn set_appends_missing_attribute() {
        let mut tag = editor("<img src=\"a.png\"/>");
        tag.set("width", "200");
        assert_eq!(tag.render(), "<img src=\"a.png\" width=\"200\"/>");
    }

    #[test]
    fn remove_drops_attribute_and_its_whitespace() {
        let mut tag = editor("<img src=\"a.png\" height=\"40\" alt=\"x\">");
        tag.remove("height");
        assert_eq!(tag.render(), "<img src=\"a.png\" alt=\"x\">");
    }

    #[test]
    fn rename_keeps_attributes() {
        let mut tag = editor("<P class=\"lead\" style=\"color:red\">Hello</P>");
        tag.rename("h1");
        let edit = tag.into_edit().unwrap();
        assert_eq!(edit.new_text, "<h1 class=\"lead\" style=\"color:red\">");
        assert_eq!((edit.byte_start, edit.byte_end), (0, 34));
    }

    #[test]
    fn style_round_trip() {
        let mut tag = editor("<img src=\"a.png\" style=\"max-width:100%\">");
        let mut style = tag.style();
        style.set("object-fit", "cover");
        tag.set_style(&style);
        assert_eq!(
            tag.render(),
            "<img src=\"a.png\" style=\"max-width: 100%; object-fit: cover;\">"
        );

        let mut style = tag.style();
        style.remove("max-width");
        style.remove("object-fit");
        tag.set_style(&style);
        assert_eq!(tag.render(), "<img src=\"a.png\">");
    }
}
