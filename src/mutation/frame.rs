//! Fit and Fill: named combinations of image framing fields.
//!
//! Neither mode is stored anywhere. Each one is a recipe that turns the
//! current descriptor of an image into an [`ImageFrame`].

use crate::mutation::fields::{ImageFrame, ObjectFit};
use crate::selection::SelectionDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingMode {
    /// `contain`, with the box pinned to its current rendered size
    Fit,
    /// `cover`, auto height, width pinned
    Fill,
}

impl SizingMode {
    pub fn frame(self, descriptor: &SelectionDescriptor) -> ImageFrame {
        let is_open = |style: &Option<String>| {
            matches!(style.as_deref(), None | Some("") | Some("auto"))
        };

        let mut frame = ImageFrame::default();
        match self {
            SizingMode::Fit => {
                frame.object_fit = Some(ObjectFit::Contain);
                if is_open(&descriptor.style_height) {
                    frame.height = descriptor.computed_height.clone();
                }
                if is_open(&descriptor.style_width) {
                    frame.width = descriptor.computed_width.clone();
                }
            }
            SizingMode::Fill => {
                frame.object_fit = Some(ObjectFit::Cover);
                frame.height = Some("auto".to_string());
                if is_open(&descriptor.style_width) {
                    frame.width = descriptor.computed_width.clone();
                }
            }
        }
        frame
    }
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMode::Fit => f.write_str("fit"),
            SizingMode::Fill => f.write_str("fill"),
        }
    }
}

impl FromStr for SizingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Ok(SizingMode::Fit),
            "fill" => Ok(SizingMode::Fill),
            other => Err(format!("unknown sizing mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn image(style_height: Option<&str>, style_width: Option<&str>) -> SelectionDescriptor {
        SelectionDescriptor {
            tag_name: "img".into(),
            address: Address::Root,
            text: String::new(),
            href: None,
            src: Some("a.png".into()),
            alt: None,
            object_fit: None,
            object_position: None,
            transform_origin: None,
            scale: Some(1.0),
            style_height: style_height.map(Into::into),
            computed_height: Some("120px".into()),
            style_width: style_width.map(Into::into),
            computed_width: Some("300px".into()),
        }
    }

    #[test]
    fn fit_pins_unsized_dimensions() {
        let frame = SizingMode::Fit.frame(&image(None, Some("auto")));
        assert_eq!(frame.object_fit, Some(ObjectFit::Contain));
        assert_eq!(frame.height.as_deref(), Some("120px"));
        assert_eq!(frame.width.as_deref(), Some("300px"));
    }

    #[test]
    fn fit_keeps_explicit_sizes() {
        let frame = SizingMode::Fit.frame(&image(Some("80px"), Some("200px")));
        assert!(frame.height.is_none());
        assert!(frame.width.is_none());
    }

    #[test]
    fn fill_forces_auto_height() {
        let frame = SizingMode::Fill.frame(&image(Some("80px"), None));
        assert_eq!(frame.object_fit, Some(ObjectFit::Cover));
        assert_eq!(frame.height.as_deref(), Some("auto"));
        assert_eq!(frame.width.as_deref(), Some("300px"));
    }
}
