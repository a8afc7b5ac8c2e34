use crate::html::escape::unescape;
use crate::html::parser::collect_elements;
use std::ops::Range;
use tree_sitter::Node;

/// Node kinds the HTML grammar uses for elements.
pub const ELEMENT_KINDS: [&str; 3] = ["element", "script_element", "style_element"];

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_element_kind(kind: &str) -> bool {
    ELEMENT_KINDS.contains(&kind)
}

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Check a tag name is safe to write into markup.
pub fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// A view of one element node in a parsed document.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    node: Node<'a>,
    source: &'a str,
}

/// One attribute as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRef {
    /// Span of the whole attribute (`name="value"`)
    pub span: Range<usize>,
    pub name: String,
    /// Decoded value; `None` for bare attributes
    pub value: Option<String>,
}

impl<'a> ElementRef<'a> {
    pub fn new(node: Node<'a>, source: &'a str) -> Self {
        Self { node, source }
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn start_byte(&self) -> usize {
        self.node.start_byte()
    }

    pub fn end_byte(&self) -> usize {
        self.node.end_byte()
    }

    /// The `start_tag` or `self_closing_tag` node.
    pub fn start_tag(&self) -> Option<Node<'a>> {
        let mut cursor = self.node.walk();
        let tag = self
            .node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "start_tag" | "self_closing_tag"));
        tag
    }

    pub fn end_tag(&self) -> Option<Node<'a>> {
        let mut cursor = self.node.walk();
        let tag = self
            .node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "end_tag");
        tag
    }

    pub fn is_self_closing(&self) -> bool {
        self.start_tag()
            .is_some_and(|tag| tag.kind() == "self_closing_tag")
    }

    /// Tag name as written (original case).
    pub fn tag_name(&self) -> &'a str {
        self.start_tag()
            .and_then(tag_name_node)
            .map(|n| &self.source[n.byte_range()])
            .unwrap_or_default()
    }

    pub fn tag_name_span(&self) -> Option<Range<usize>> {
        self.start_tag().and_then(tag_name_node).map(|n| n.byte_range())
    }

    pub fn end_tag_name_span(&self) -> Option<Range<usize>> {
        self.end_tag().and_then(tag_name_node).map(|n| n.byte_range())
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(tag)
    }

    pub fn is_void(&self) -> bool {
        is_void_element(self.tag_name())
    }

    /// `script`/`style` hold raw text, not markup.
    pub fn is_raw_text(&self) -> bool {
        self.node.kind() != "element"
    }

    pub fn attributes(&self) -> Vec<AttributeRef> {
        let Some(tag) = self.start_tag() else {
            return Vec::new();
        };

        let mut cursor = tag.walk();
        tag.named_children(&mut cursor)
            .filter(|c| c.kind() == "attribute")
            .map(|attr| attribute_ref(attr, self.source))
            .collect()
    }

    /// First attribute with `name` (ASCII case-insensitive), decoded.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.unwrap_or_default())
    }

    /// Byte range between the start tag and the end tag.
    ///
    /// For elements closed implicitly the range runs to the end of the element.
    pub fn content_range(&self) -> Range<usize> {
        let start = self
            .start_tag()
            .map(|t| t.end_byte())
            .unwrap_or(self.start_byte());
        let end = self
            .end_tag()
            .map(|t| t.start_byte())
            .unwrap_or(self.end_byte());
        start..end.max(start)
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        let mut current = self.node.parent();
        while let Some(node) = current {
            if is_element_kind(node.kind()) {
                return Some(ElementRef::new(node, self.source));
            }
            current = node.parent();
        }
        None
    }

    /// Every element of the document this element belongs to.
    pub fn document_elements(&self) -> Vec<ElementRef<'a>> {
        let mut root = self.node;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        let mut out = Vec::new();
        collect_elements(root, self.source, &mut out);
        out
    }

    /// Element children in document order.
    pub fn children(&self) -> Vec<ElementRef<'a>> {
        Self::element_children(self.node, self.source)
    }

    pub fn element_children(node: Node<'a>, source: &'a str) -> Vec<ElementRef<'a>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|c| is_element_kind(c.kind()))
            .map(|c| ElementRef::new(c, source))
            .collect()
    }

    /// 1-based position among preceding siblings with the same tag name.
    pub fn ordinal(&self) -> usize {
        let tag = self.tag_name();
        let mut ordinal = 1;
        let mut sibling = self.node.prev_named_sibling();
        while let Some(node) = sibling {
            if is_element_kind(node.kind()) && ElementRef::new(node, self.source).is(tag) {
                ordinal += 1;
            }
            sibling = node.prev_named_sibling();
        }
        ordinal
    }

    /// Nearest anchor, starting with the element itself.
    pub fn closest_anchor(&self) -> Option<ElementRef<'a>> {
        let mut current = Some(*self);
        while let Some(el) = current {
            if el.is("a") {
                return Some(el);
            }
            current = el.parent();
        }
        None
    }

    /// Rendered text: markup dropped, references decoded, whitespace collapsed,
    /// `<br>` read as a line break.
    pub fn text_content(&self) -> String {
        if self.is_raw_text() {
            return String::new();
        }

        let mut raw = String::new();
        collect_text(self.node, self.source, &mut raw);

        let mut out = String::with_capacity(raw.len());
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let collapsed = line
                .split(' ')
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&collapsed);
        }
        out.trim_matches(|c: char| c == ' ' || c == '\n').to_string()
    }
}

fn tag_name_node(tag: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = tag.walk();
    let name = tag
        .named_children(&mut cursor)
        .find(|c| c.kind() == "tag_name");
    name
}

fn attribute_ref(attr: Node<'_>, source: &str) -> AttributeRef {
    let mut name = String::new();
    let mut value = None;

    let mut cursor = attr.walk();
    for child in attr.named_children(&mut cursor) {
        match child.kind() {
            "attribute_name" => name = source[child.byte_range()].to_string(),
            "attribute_value" => value = Some(unescape(&source[child.byte_range()]).into_owned()),
            "quoted_attribute_value" => {
                let raw = &source[child.byte_range()];
                let inner = raw
                    .get(1..raw.len().saturating_sub(1))
                    .unwrap_or_default();
                value = Some(unescape(inner).into_owned());
            }
            _ => {}
        }
    }

    AttributeRef {
        span: attr.byte_range(),
        name,
        value,
    }
}

/// Gather text under `node`, keeping whitespace gaps between tokens.
fn collect_text(node: Node<'_>, source: &str, out: &mut String) {
    let mut cursor = node.walk();
    let mut last_end: Option<usize> = None;

    for child in node.named_children(&mut cursor) {
        if let Some(end) = last_end {
            if child.start_byte() > end && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        last_end = Some(child.end_byte());

        match child.kind() {
            "text" | "entity" => {
                let text = unescape(&source[child.byte_range()]);
                // Source line breaks are layout whitespace; only <br> breaks lines.
                out.extend(text.chars().map(|c| if c.is_ascii_whitespace() { ' ' } else { c }));
            }
            "element" => {
                let el = ElementRef::new(child, source);
                if el.is("br") {
                    out.push('\n');
                } else {
                    collect_text(child, source, out);
                }
            }
            _ => {}
        }
    }
}
