use crate::address::errors::AddressError;
use crate::html::{is_valid_tag_name, ContentRoot, ElementRef, ParsedHtml};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ID_PREFIX: &str = "//*[@id=";

/// Positional or identifier-based name of an element.
///
/// Path addresses are relative to the content root (`<body>`, or the
/// document for fragments) and render as `/tag[ordinal]` steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// The content root itself (`""`)
    Root,
    /// `//*[@id="..."]`, single-quoted when the id holds a `"`
    Id(String),
    Path(Vec<Step>),
}

/// One `/tag[ordinal]` step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    /// Lowercase tag name
    pub tag: String,
    /// 1-based among same-tag siblings; `None` matches every same-tag sibling
    pub ordinal: Option<usize>,
}

impl Step {
    pub fn new(tag: &str, ordinal: usize) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ordinal: Some(ordinal),
        }
    }

    pub fn any(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ordinal: None,
        }
    }

    fn matches_prefix(&self, tag: &str) -> bool {
        self.tag == tag && matches!(self.ordinal, None | Some(1))
    }

    /// Siblings selected by this step, in document order.
    ///
    /// A `tbody` step under a table without an explicit `<tbody>` selects the
    /// table itself, so addresses captured from a browser rendering (which
    /// inserts the tbody) still resolve against the source markup.
    fn select<'p>(
        &self,
        parent: Option<ElementRef<'p>>,
        siblings: &[ElementRef<'p>],
    ) -> Vec<ElementRef<'p>> {
        if self.tag == "tbody" && matches!(self.ordinal, None | Some(1)) {
            if let Some(table) = parent.filter(|p| p.is("table")) {
                if !siblings.iter().any(|s| s.is("tbody")) {
                    return vec![table];
                }
            }
        }

        let same_tag = siblings.iter().filter(|s| s.is(&self.tag)).copied();
        match self.ordinal {
            Some(n) => same_tag.skip(n.saturating_sub(1)).take(1).collect(),
            None => same_tag.collect(),
        }
    }
}

impl Address {
    /// Compute the address of `element` relative to `root`.
    ///
    /// An `id` wins over the positional path when no other element in the
    /// document carries it and it can be written back as an address.
    pub fn encode(element: &ElementRef<'_>, root: &ContentRoot<'_>) -> Self {
        if root.is(element) {
            return Address::Root;
        }

        if let Some(id) = addressable_id(element) {
            return Address::Id(id);
        }

        let mut steps = Vec::new();
        let mut current = *element;
        loop {
            steps.push(Step::new(current.tag_name(), current.ordinal()));
            match current.parent() {
                Some(parent) if !root.is(&parent) && !parent.is("body") => current = parent,
                _ => break,
            }
        }
        steps.reverse();

        Address::Path(steps)
    }

    /// Find the element this address names, without recovery.
    ///
    /// When a path matches several elements (ordinal-less steps), the first
    /// in document order wins.
    pub fn locate<'p>(&self, parsed: &'p ParsedHtml<'_>) -> Option<ElementRef<'p>> {
        match self {
            Address::Root => parsed.content_root().as_element(),
            Address::Id(id) => parsed
                .elements()
                .into_iter()
                .find(|el| el.attribute("id").as_deref() == Some(id.as_str())),
            Address::Path(steps) => locate_path(steps, parsed.content_root()),
        }
    }

    /// The path with an ordinal-less `a` step inserted before the last step.
    ///
    /// Compensates for a target that a previous edit wrapped in a new link.
    /// Identifier and root addresses have no such variant.
    pub fn with_anchor_step(&self) -> Option<Self> {
        match self {
            Address::Path(steps) if !steps.is_empty() => {
                let mut steps = steps.clone();
                steps.insert(steps.len() - 1, Step::any("a"));
                Some(Address::Path(steps))
            }
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Address::Root)
    }

    pub fn steps(&self) -> &[Step] {
        match self {
            Address::Path(steps) => steps,
            _ => &[],
        }
    }
}

fn addressable_id(element: &ElementRef<'_>) -> Option<String> {
    let id = element.attribute("id").filter(|id| !id.is_empty())?;
    // No quote style can enclose both kinds.
    if id.contains('"') && id.contains('\'') {
        return None;
    }

    let holders = element
        .document_elements()
        .iter()
        .filter(|el| el.attribute("id").as_deref() == Some(id.as_str()))
        .count();
    (holders == 1).then_some(id)
}

fn locate_path<'p>(steps: &[Step], root: ContentRoot<'p>) -> Option<ElementRef<'p>> {
    let mut groups = vec![(root.as_element(), root.children())];
    let mut matched = Vec::new();

    for step in steps {
        matched = groups
            .iter()
            .flat_map(|(parent, siblings)| step.select(*parent, siblings))
            .collect::<Vec<_>>();
        if matched.is_empty() {
            return None;
        }
        groups = matched.iter().map(|el| (Some(*el), el.children())).collect();
    }

    matched.into_iter().next()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Root => Ok(()),
            Address::Id(id) if id.contains('"') => write!(f, "{ID_PREFIX}'{id}']"),
            Address::Id(id) => write!(f, "{ID_PREFIX}\"{id}\"]"),
            Address::Path(steps) => {
                for step in steps {
                    write!(f, "{step}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal {
            Some(n) => write!(f, "/{}[{}]", self.tag, n),
            None => write!(f, "/{}", self.tag),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(Address::Root);
        }

        if let Some(rest) = text.strip_prefix(ID_PREFIX) {
            return parse_id(s, rest).map(Address::Id);
        }

        let Some(path) = text.strip_prefix('/') else {
            return Err(AddressError::malformed(
                s,
                "expected a path starting with '/' or an id reference",
            ));
        };

        let mut steps = path
            .split('/')
            .map(|segment| parse_step(s, segment))
            .collect::<Result<Vec<_>, _>>()?;

        // Addresses taken from a full document carry the body prefix.
        if steps.len() >= 2 && steps[0].matches_prefix("html") && steps[1].matches_prefix("body") {
            steps.drain(..2);
        }

        if steps.is_empty() {
            Ok(Address::Root)
        } else {
            Ok(Address::Path(steps))
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

fn parse_id(address: &str, rest: &str) -> Result<String, AddressError> {
    let mut chars = rest.chars();
    let quote = match chars.next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Err(AddressError::malformed(address, "id must be quoted")),
    };

    let body = chars.as_str();
    let end = body
        .find(quote)
        .ok_or_else(|| AddressError::malformed(address, "unterminated id"))?;
    if &body[end + 1..] != "]" {
        return Err(AddressError::malformed(address, "expected ']' after id"));
    }

    Ok(body[..end].to_string())
}

fn parse_step(address: &str, segment: &str) -> Result<Step, AddressError> {
    let invalid = || AddressError::InvalidStep {
        address: address.to_string(),
        step: segment.to_string(),
    };

    let (tag, ordinal) = match segment.split_once('[') {
        Some((tag, rest)) => {
            let digits = rest.strip_suffix(']').ok_or_else(invalid)?;
            let ordinal = digits
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(invalid)?;
            (tag, Some(ordinal))
        }
        None => (segment, None),
    };

    if !is_valid_tag_name(tag) {
        return Err(invalid());
    }

    Ok(Step {
        tag: tag.to_ascii_lowercase(),
        ordinal,
    })
}
