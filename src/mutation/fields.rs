//! The edit model carried across the engine boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every field an operator can change on one element.
///
/// Absent fields are left alone. Fields apply in a fixed order: the tag
/// morph first (later fields address the new element), then text, then
/// attributes, then image framing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ElementEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<ObjectFit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl ElementEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tag_name.is_none()
            && self.text.is_none()
            && self.src.is_none()
            && self.href.is_none()
            && self.alt.is_none()
            && self.frame().is_empty()
    }

    /// Add one field, replacing any earlier value for it.
    pub fn with(mut self, field: FieldEdit) -> Self {
        self.set(field);
        self
    }

    pub fn set(&mut self, field: FieldEdit) {
        match field {
            FieldEdit::Morph(tag) => self.tag_name = Some(tag),
            FieldEdit::Text(text) => self.text = Some(text),
            FieldEdit::Attribute(AttributeField::Href, value) => self.href = Some(value),
            FieldEdit::Attribute(AttributeField::Src, value) => self.src = Some(value),
            FieldEdit::Attribute(AttributeField::Alt, value) => self.alt = Some(value),
            FieldEdit::Frame(frame) => {
                let ImageFrame {
                    object_fit,
                    object_position,
                    height,
                    width,
                    scale,
                } = frame;
                self.object_fit = object_fit.or(self.object_fit);
                self.object_position = object_position.or(self.object_position.take());
                self.height = height.or(self.height.take());
                self.width = width.or(self.width.take());
                self.scale = scale.or(self.scale);
            }
        }
    }

    /// The image-framing part of this edit.
    pub fn frame(&self) -> ImageFrame {
        ImageFrame {
            object_fit: self.object_fit,
            object_position: self.object_position.clone(),
            height: self.height.clone(),
            width: self.width.clone(),
            scale: self.scale,
        }
    }

    /// Attribute fields present in this edit, in application order.
    pub fn attributes(&self) -> Vec<(AttributeField, &str)> {
        [
            (AttributeField::Src, &self.src),
            (AttributeField::Alt, &self.alt),
            (AttributeField::Href, &self.href),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

impl From<FieldEdit> for ElementEdit {
    fn from(field: FieldEdit) -> Self {
        ElementEdit::new().with(field)
    }
}

impl FromIterator<FieldEdit> for ElementEdit {
    fn from_iter<I: IntoIterator<Item = FieldEdit>>(iter: I) -> Self {
        let mut edit = ElementEdit::new();
        for field in iter {
            edit.set(field);
        }
        edit
    }
}

/// One typed field change.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    /// Change the element's tag, keeping attributes and content
    Morph(String),
    /// Replace the rendered text
    Text(String),
    Attribute(AttributeField, String),
    /// Image sizing, crop and zoom
    Frame(ImageFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeField {
    Href,
    Src,
    Alt,
}

impl AttributeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeField::Href => "href",
            AttributeField::Src => "src",
            AttributeField::Alt => "alt",
        }
    }
}

/// Image framing fields. Only meaningful on `<img>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageFrame {
    pub object_fit: Option<ObjectFit>,
    /// Crop position; mirrored into `transform-origin`
    pub object_position: Option<String>,
    /// CSS length or `auto`
    pub height: Option<String>,
    pub width: Option<String>,
    /// Zoom factor; `1` clears the transform
    pub scale: Option<f64>,
}

impl ImageFrame {
    pub fn is_empty(&self) -> bool {
        self.object_fit.is_none()
            && self.object_position.is_none()
            && self.height.is_none()
            && self.width.is_none()
            && self.scale.is_none()
    }

    /// Names of the fields present, as they appear in serialized edits.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.object_fit.is_some() {
            names.push("objectFit");
        }
        if self.object_position.is_some() {
            names.push("objectPosition");
        }
        if self.height.is_some() {
            names.push("height");
        }
        if self.width.is_some() {
            names.push("width");
        }
        if self.scale.is_some() {
            names.push("scale");
        }
        names
    }
}

/// CSS `object-fit` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    Fill,
    Contain,
    Cover,
    None,
    ScaleDown,
}

impl ObjectFit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectFit::Fill => "fill",
            ObjectFit::Contain => "contain",
            ObjectFit::Cover => "cover",
            ObjectFit::None => "none",
            ObjectFit::ScaleDown => "scale-down",
        }
    }
}

impl fmt::Display for ObjectFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectFit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill" => Ok(ObjectFit::Fill),
            "contain" => Ok(ObjectFit::Contain),
            "cover" => Ok(ObjectFit::Cover),
            "none" => Ok(ObjectFit::None),
            "scale-down" => Ok(ObjectFit::ScaleDown),
            other => Err(format!("unknown object-fit value: {other}")),
        }
    }
}

/// Percent crop position, `"<x>% <y>%"`.
///
/// The one shape `object-position` is written in, so the crop point and the
/// zoom pivot that mirrors it always print the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPosition {
    pub x: f64,
    pub y: f64,
}

impl CropPosition {
    pub const CENTER: CropPosition = CropPosition { x: 50.0, y: 50.0 };

    /// Read a position, falling back to the center on anything unparseable.
    pub fn parse_or_center(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl Default for CropPosition {
    fn default() -> Self {
        CropPosition::CENTER
    }
}

impl fmt::Display for CropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% {}%", self.x, self.y)
    }
}

impl FromStr for CropPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = |part: &str| {
            part.strip_suffix('%')
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(x), Some(y), None) => match (percent(x), percent(y)) {
                (Some(x), Some(y)) => Ok(CropPosition { x, y }),
                _ => Err(format!("expected \"<x>% <y>%\", got {s:?}")),
            },
            _ => Err(format!("expected \"<x>% <y>%\", got {s:?}")),
        }
    }
}

/// Check an image dimension: `auto`, empty, or a plain CSS length.
pub fn is_dimension(value: &str) -> bool {
    const UNITS: [&str; 8] = ["px", "%", "em", "rem", "vw", "vh", "pt", ""];

    let value = value.trim();
    if value.is_empty() || value == "auto" {
        return true;
    }
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    number.parse::<f64>().is_ok_and(f64::is_finite) && UNITS.contains(&unit)
}
