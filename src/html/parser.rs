use crate::html::element::{is_element_kind, ElementRef};
use crate::html::errors::HtmlError;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Node, Parser, Tree};

/// Tree-sitter parser wrapper for HTML documents.
pub struct HtmlParser {
    parser: Parser,
}

impl HtmlParser {
    pub fn new() -> Result<Self, HtmlError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = SupportLang::Html.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| HtmlError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, HtmlError> {
        self.parser
            .parse(source, None)
            .ok_or(HtmlError::ParseFailed)
    }

    /// Parse source and return the tree along with the source.
    pub fn parse_with_source<'a>(&mut self, source: &'a str) -> Result<ParsedHtml<'a>, HtmlError> {
        let tree = self.parse(source)?;
        Ok(ParsedHtml { source, tree })
    }
}

/// The node that element addresses are rooted at.
#[derive(Clone, Copy)]
pub enum ContentRoot<'a> {
    /// The document's `<body>` element
    Body(ElementRef<'a>),
    /// A fragment without `<body>`: top-level elements are the root's children
    Document(Node<'a>, &'a str),
}

impl<'a> ContentRoot<'a> {
    /// Element children of the root, in document order.
    pub fn children(&self) -> Vec<ElementRef<'a>> {
        match self {
            ContentRoot::Body(body) => body.children(),
            ContentRoot::Document(node, source) => ElementRef::element_children(*node, source),
        }
    }

    /// Whether `element` is the root itself.
    pub fn is(&self, element: &ElementRef<'_>) -> bool {
        match self {
            ContentRoot::Body(body) => body.start_byte() == element.start_byte(),
            ContentRoot::Document(..) => false,
        }
    }

    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            ContentRoot::Body(body) => Some(*body),
            ContentRoot::Document(..) => None,
        }
    }
}

/// A parsed HTML document with its tree-sitter tree.
pub struct ParsedHtml<'a> {
    pub source: &'a str,
    pub tree: Tree,
}

impl<'a> ParsedHtml<'a> {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    /// Extract text for a node's byte range.
    pub fn node_text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    /// Every element in document order.
    pub fn elements(&self) -> Vec<ElementRef<'_>> {
        let mut out = Vec::new();
        collect_elements(self.tree.root_node(), self.source, &mut out);
        out
    }

    /// The `<body>` element, or the document node for fragments.
    pub fn content_root(&self) -> ContentRoot<'_> {
        self.elements()
            .into_iter()
            .find(|el| el.tag_name().eq_ignore_ascii_case("body"))
            .map(ContentRoot::Body)
            .unwrap_or(ContentRoot::Document(self.tree.root_node(), self.source))
    }

    /// The element whose start tag begins exactly at `offset`.
    pub fn element_at(&self, offset: usize) -> Option<ElementRef<'_>> {
        let mut node = self.tree.root_node();
        'descend: loop {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.start_byte() > offset {
                    break;
                }
                if is_element_kind(child.kind()) && child.start_byte() == offset {
                    return Some(ElementRef::new(child, self.source));
                }
                if child.end_byte() <= offset {
                    continue;
                }
                node = child;
                continue 'descend;
            }
            return None;
        }
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
    pub end_point: tree_sitter::Point,
}

fn collect_error_nodes(node: Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
            end_point: node.end_position(),
        });
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

pub(crate) fn collect_elements<'a>(node: Node<'a>, source: &'a str, out: &mut Vec<ElementRef<'a>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if is_element_kind(child.kind()) {
            out.push(ElementRef::new(child, source));
        }
        collect_elements(child, source, out);
    }
}
