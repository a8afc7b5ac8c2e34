//! Reading an element's editable state.
//!
//! The inverse of the mutation path: given a resolved element, report what
//! the properties panel shows for it.

use crate::address::{resolve, Address};
use crate::html::{ElementRef, HtmlError};
use crate::mutation::fields::{CropPosition, ElementEdit, ObjectFit};
use crate::mutation::frame::SizingMode;
use crate::pool;
use crate::style::InlineStyle;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tags the editing surface treats as clickable targets.
pub const EDITABLE_TAGS: [&str; 13] = [
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "img", "span", "li", "td", "div",
];

pub fn is_editable(tag: &str) -> bool {
    EDITABLE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Snapshot of one element's editable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDescriptor {
    /// Lowercase tag name
    pub tag_name: String,
    pub address: Address,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<ObjectFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_width: Option<String>,
}

impl SelectionDescriptor {
    pub fn is_image(&self) -> bool {
        self.tag_name == "img"
    }

    /// Which composite sizing mode an image is in.
    pub fn sizing_mode(&self) -> Option<SizingMode> {
        if !self.is_image() {
            return None;
        }
        let fill = match self.style_height.as_deref() {
            Some("auto") => true,
            None | Some("") => self.object_fit == Some(ObjectFit::Cover),
            Some(_) => false,
        };
        Some(if fill { SizingMode::Fill } else { SizingMode::Fit })
    }

    /// Fold applied fields into the descriptor.
    pub fn merge(&mut self, edit: &ElementEdit) {
        if let Some(tag) = &edit.tag_name {
            self.tag_name = tag.to_ascii_lowercase();
        }
        if let Some(text) = &edit.text {
            self.text = text.clone();
        }
        if let Some(href) = &edit.href {
            self.href = Some(href.clone());
        }
        if let Some(src) = &edit.src {
            self.src = Some(src.clone());
        }
        if let Some(alt) = &edit.alt {
            self.alt = Some(alt.clone());
        }
        if let Some(fit) = edit.object_fit {
            self.object_fit = Some(fit);
        }
        if let Some(position) = &edit.object_position {
            self.object_position = Some(position.clone());
            self.transform_origin = Some(position.clone());
        }
        if let Some(height) = &edit.height {
            self.style_height = Some(height.clone());
        }
        if let Some(width) = &edit.width {
            self.style_width = Some(width.clone());
        }
        if let Some(scale) = edit.scale {
            self.scale = Some(scale);
        }
    }
}

/// Rendered (post-layout) element sizes in CSS pixels.
///
/// Layout happens outside this crate; the surface that renders the document
/// supplies the measurements.
pub trait RenderMetrics {
    fn width(&self, element: &ElementRef<'_>) -> Option<f64>;
    fn height(&self, element: &ElementRef<'_>) -> Option<f64>;
}

/// Sizes from the markup itself: inline `px` styles, then the
/// `width`/`height` attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredMetrics;

impl RenderMetrics for DeclaredMetrics {
    fn width(&self, element: &ElementRef<'_>) -> Option<f64> {
        declared_size(element, "width")
    }

    fn height(&self, element: &ElementRef<'_>) -> Option<f64> {
        declared_size(element, "height")
    }
}

/// Sizes measured by a renderer for the selected element.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasuredMetrics {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl RenderMetrics for MeasuredMetrics {
    fn width(&self, element: &ElementRef<'_>) -> Option<f64> {
        self.width.or_else(|| DeclaredMetrics.width(element))
    }

    fn height(&self, element: &ElementRef<'_>) -> Option<f64> {
        self.height.or_else(|| DeclaredMetrics.height(element))
    }
}

fn declared_size(element: &ElementRef<'_>, axis: &str) -> Option<f64> {
    let style = element
        .attribute("style")
        .map(|s| InlineStyle::parse(&s));
    let from_style = style
        .as_ref()
        .and_then(|s| s.get(axis))
        .and_then(|v| v.strip_suffix("px"))
        .and_then(|v| v.trim().parse::<f64>().ok());

    from_style.or_else(|| {
        element
            .attribute(axis)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
    })
}

/// Read the descriptor for an already resolved element.
pub fn extract(
    element: &ElementRef<'_>,
    address: Address,
    metrics: &dyn RenderMetrics,
) -> SelectionDescriptor {
    let mut descriptor = SelectionDescriptor {
        tag_name: element.tag_name().to_ascii_lowercase(),
        address,
        text: element.text_content(),
        href: element
            .closest_anchor()
            .and_then(|anchor| anchor.attribute("href")),
        src: None,
        alt: None,
        object_fit: None,
        object_position: None,
        transform_origin: None,
        scale: None,
        style_height: None,
        computed_height: None,
        style_width: None,
        computed_width: None,
    };

    if element.is("img") {
        let style = InlineStyle::parse(&element.attribute("style").unwrap_or_default());
        let non_empty = |v: Option<&str>| v.filter(|v| !v.is_empty()).map(str::to_string);

        descriptor.src = element.attribute("src");
        descriptor.alt = element.attribute("alt");
        descriptor.object_fit = style.get("object-fit").and_then(|v| v.parse().ok());
        let position = |property| {
            CropPosition::parse_or_center(style.get(property).unwrap_or_default()).to_string()
        };
        descriptor.object_position = Some(position("object-position"));
        descriptor.transform_origin = Some(position("transform-origin"));
        descriptor.scale = Some(style.get("transform").and_then(parse_scale).unwrap_or(1.0));
        descriptor.style_height = non_empty(style.get("height"));
        descriptor.style_width = non_empty(style.get("width"));
        descriptor.computed_height = metrics.height(element).map(px);
        descriptor.computed_width = metrics.width(element).map(px);
    }

    descriptor
}

/// Resolve `address` in `html` and read the element's descriptor.
///
/// Returns `None` when the address is malformed or names nothing.
pub fn extract_at(
    html: &str,
    address: &str,
    metrics: &dyn RenderMetrics,
) -> Option<SelectionDescriptor> {
    let address: Address = match address.parse() {
        Ok(address) => address,
        Err(err) => {
            debug!(%err, "selection address rejected");
            return None;
        }
    };

    pool::with_parser(|parser| -> Option<SelectionDescriptor> {
        let parsed = parser.parse_with_source(html).ok()?;
        let resolution = resolve(&parsed, &address)?;
        let canonical = Address::encode(&resolution.element, &parsed.content_root());
        Some(extract(&resolution.element, canonical, metrics))
    })
    .ok()
    .flatten()
}

/// Horizontal scale component of a 2-D transform.
///
/// Understands `scale(x)`, `scale(x, y)`, `scaleX(x)` and `matrix(a, ...)`;
/// `none` and anything else yield `None`.
pub fn parse_scale(transform: &str) -> Option<f64> {
    let transform = transform.trim();
    let (function, rest) = transform.split_once('(')?;
    let args = rest.split(')').next()?;
    let first = args.split([',', ' ']).find(|a| !a.trim().is_empty())?;

    match function.trim().to_ascii_lowercase().as_str() {
        "scale" | "scalex" | "matrix" => first.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// An editable element and its address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableElement {
    pub address: Address,
    pub tag_name: String,
    pub text: String,
}

/// Every editable element under the content root, in document order.
pub fn list_editable(html: &str) -> Result<Vec<EditableElement>, HtmlError> {
    pool::with_parser(|parser| -> Result<Vec<EditableElement>, HtmlError> {
        let parsed = parser.parse_with_source(html)?;
        let root = parsed.content_root();
        let scope = root
            .as_element()
            .map(|body| body.start_byte()..body.end_byte())
            .unwrap_or(0..html.len());

        Ok(parsed
            .elements()
            .into_iter()
            .filter(|el| scope.contains(&el.start_byte()) && !root.is(el))
            .filter(|el| is_editable(el.tag_name()))
            .map(|el| EditableElement {
                address: Address::encode(&el, &root),
                tag_name: el.tag_name().to_ascii_lowercase(),
                text: el.text_content(),
            })
            .collect())
    })?
}

fn px(value: f64) -> String {
    format!("{value}px")
}
