//! Compiles an [`ElementEdit`] into span edits, one step at a time.
//!
//! Each step re-parses the working text, finds the target again by the byte
//! offset of its start tag, plans a batch of [`Edit`]s and applies it. The
//! offset is carried through every batch with [`map_offset`], so a morph or
//! a link wrap in an early step does not lose the element for later steps.

use crate::edit::{map_offset, Edit};
use crate::html::{
    escape_text, is_valid_tag_name, is_void_element, ElementRef, TagEditor,
};
use crate::mutation::errors::{MutationError, UnsupportedField};
use crate::mutation::fields::{is_dimension, AttributeField, CropPosition, ElementEdit, ImageFrame};
use crate::pool;
use tracing::{debug, warn};

/// Tags whose content is raw text.
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

/// Result of running every step of an edit.
#[derive(Debug)]
pub struct Applied {
    pub html: String,
    /// Start offset of the edited element in `html`
    pub anchor: usize,
    pub ignored: Vec<UnsupportedField>,
}

/// Apply `edit` to the element whose start tag begins at `anchor`.
pub fn apply_fields(html: &str, anchor: usize, edit: &ElementEdit) -> Result<Applied, MutationError> {
    let mut bench = Workbench {
        html: html.to_string(),
        anchor,
        ignored: Vec::new(),
    };

    if let Some(tag) = &edit.tag_name {
        bench.step("tagName", |el, ignored| morph(el, tag, ignored))?;
    }
    if let Some(text) = &edit.text {
        bench.step("text", |el, ignored| replace_text(el, text, ignored))?;
    }
    let attributes = edit.attributes();
    if !attributes.is_empty() {
        bench.step("attributes", |el, ignored| set_attributes(el, &attributes, ignored))?;
    }
    let frame = edit.frame();
    if !frame.is_empty() {
        bench.step("frame", |el, ignored| apply_frame(el, &frame, ignored))?;
    }

    Ok(Applied {
        html: bench.html,
        anchor: bench.anchor,
        ignored: bench.ignored,
    })
}

struct Workbench {
    html: String,
    anchor: usize,
    ignored: Vec<UnsupportedField>,
}

impl Workbench {
    fn step<F>(&mut self, name: &'static str, plan: F) -> Result<(), MutationError>
    where
        F: FnOnce(&ElementRef<'_>, &mut Vec<UnsupportedField>) -> Result<Vec<Edit>, MutationError>,
    {
        let html = &self.html;
        let anchor = self.anchor;
        let ignored = &mut self.ignored;

        let edits = pool::with_parser(|parser| -> Result<Vec<Edit>, MutationError> {
            let parsed = parser.parse_with_source(html)?;
            let element = parsed
                .element_at(anchor)
                .ok_or(MutationError::TargetLost { offset: anchor })?;
            plan(&element, ignored)
        })??;

        if edits.is_empty() {
            debug!(step = name, "nothing to change");
            return Ok(());
        }

        debug!(step = name, edits = edits.len(), "applying step");
        let anchor = map_offset(self.anchor, &edits);
        self.html = Edit::apply_batch(&self.html, edits)?;
        self.anchor = anchor;
        Ok(())
    }
}

fn unsupported(field: &'static str, el: &ElementRef<'_>) -> UnsupportedField {
    let tag = el.tag_name().to_ascii_lowercase();
    warn!(field, %tag, "field not supported on this element, ignoring");
    UnsupportedField { field, tag }
}

fn start_tag(el: &ElementRef<'_>) -> Result<TagEditor, MutationError> {
    TagEditor::new(el).ok_or(MutationError::TargetLost {
        offset: el.start_byte(),
    })
}

/// Change the tag, keeping attributes and content.
fn morph(
    el: &ElementRef<'_>,
    tag: &str,
    ignored: &mut Vec<UnsupportedField>,
) -> Result<Vec<Edit>, MutationError> {
    let tag = tag.trim();
    if !is_valid_tag_name(tag) {
        return Err(MutationError::InvalidTagName {
            name: tag.to_string(),
        });
    }
    if el.is(tag) {
        return Ok(Vec::new());
    }

    let new_tag = tag.to_ascii_lowercase();
    if is_void_element(&new_tag)
        || RAW_TEXT_TAGS.contains(&new_tag.as_str())
        || el.is_raw_text()
    {
        ignored.push(unsupported("tagName", el));
        return Ok(Vec::new());
    }

    let source = el.source();
    let mut open = start_tag(el)?;
    open.rename(&new_tag);
    open.open_form();
    let mut edits: Vec<Edit> = open.into_edit().into_iter().collect();

    match el.end_tag_name_span() {
        Some(span) => edits.push(Edit::replace(source, span, new_tag.as_str())),
        None => edits.push(Edit::insert(el.end_byte(), format!("</{new_tag}>"))),
    }

    debug!(from = el.tag_name(), to = %new_tag, "morphing element");
    Ok(edits)
}

/// Replace the rendered text. Line breaks become `<br>`.
fn replace_text(
    el: &ElementRef<'_>,
    text: &str,
    ignored: &mut Vec<UnsupportedField>,
) -> Result<Vec<Edit>, MutationError> {
    if el.is_void() || el.is_raw_text() || el.is_self_closing() {
        ignored.push(unsupported("text", el));
        return Ok(Vec::new());
    }

    let rendered = text
        .replace("\r\n", "\n")
        .split('\n')
        .map(|line| escape_text(line).into_owned())
        .collect::<Vec<_>>()
        .join("<br>");

    Ok(vec![Edit::replace(el.source(), el.content_range(), rendered)])
}

/// `src`/`alt` on images; `href` on the element, its parent link, or a new
/// wrapping link.
fn set_attributes(
    el: &ElementRef<'_>,
    fields: &[(AttributeField, &str)],
    ignored: &mut Vec<UnsupportedField>,
) -> Result<Vec<Edit>, MutationError> {
    let mut own = start_tag(el)?;
    let mut edits = Vec::new();

    for &(field, value) in fields {
        match field {
            AttributeField::Src | AttributeField::Alt if !el.is("img") => {
                ignored.push(unsupported(field.as_str(), el));
            }
            AttributeField::Src | AttributeField::Alt => own.set(field.as_str(), value),
            AttributeField::Href => {
                if el.is("a") {
                    own.set("href", value);
                } else if let Some(parent) = el.parent().filter(|p| p.is("a")) {
                    let mut link = start_tag(&parent)?;
                    link.set("href", value);
                    edits.extend(link.into_edit());
                } else if !value.is_empty() {
                    debug!(tag = el.tag_name(), "wrapping element in a new link");
                    let mut link = TagEditor::insert_at(el.start_byte(), "a");
                    link.set("href", value);
                    edits.extend(link.into_edit());
                    edits.push(Edit::insert(el.end_byte(), "</a>"));
                }
            }
        }
    }

    edits.extend(own.into_edit());
    Ok(edits)
}

/// Image sizing, crop position and zoom.
fn apply_frame(
    el: &ElementRef<'_>,
    frame: &ImageFrame,
    ignored: &mut Vec<UnsupportedField>,
) -> Result<Vec<Edit>, MutationError> {
    if !el.is("img") {
        for field in frame.field_names() {
            ignored.push(unsupported(field, el));
        }
        return Ok(Vec::new());
    }

    let mut tag = start_tag(el)?;
    let mut style = tag.style();
    let mut edits = Vec::new();

    if let Some(fit) = frame.object_fit {
        style.set("object-fit", fit.as_str());
    }

    // Crop point and zoom pivot always move together.
    if let Some(position) = &frame.object_position {
        let position = position
            .parse::<CropPosition>()
            .map_err(|_| MutationError::InvalidValue {
                field: "objectPosition",
                value: position.clone(),
            })?
            .to_string();
        style.set("object-position", &position);
        style.set("transform-origin", &position);
    }

    for (property, value) in [("height", &frame.height), ("width", &frame.width)] {
        let Some(value) = value.as_deref().map(str::trim) else {
            continue;
        };
        if !is_dimension(value) {
            return Err(MutationError::InvalidValue {
                field: property,
                value: value.to_string(),
            });
        }
        style.set(property, value);
        if value.is_empty() || value == "auto" {
            tag.remove(property);
        } else {
            tag.set(property, &value.replacen("px", "", 1));
        }
    }

    if let Some(scale) = frame.scale {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(MutationError::InvalidValue {
                field: "scale",
                value: scale.to_string(),
            });
        }

        if scale == 1.0 {
            style.remove("transform");
        } else {
            style.set("transform", &format!("scale({scale})"));
            match el.parent() {
                Some(parent) => {
                    let mut clip = start_tag(&parent)?;
                    let mut parent_style = clip.style();
                    parent_style.set("overflow", "hidden");
                    parent_style.set("display", "block");
                    clip.set_style(&parent_style);
                    edits.extend(clip.into_edit());
                }
                None => warn!("scaled image has no parent element to clip it"),
            }
        }
    }

    tag.set_style(&style);
    edits.extend(tag.into_edit());
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str, target: &str, edit: ElementEdit) -> Applied {
        let anchor = html.find(target).unwrap();
        apply_fields(html, anchor, &edit).unwrap()
    }

    #[test]
    fn morph_keeps_attributes_and_content() {
        let applied = run(
            "<div><P class=\"x\">Hello <b>you</b></P></div>",
            "<P",
            ElementEdit {
                tag_name: Some("H1".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<div><h1 class=\"x\">Hello <b>you</b></h1></div>");
        assert_eq!(applied.anchor, 5);
    }

    #[test]
    fn morph_closes_element_without_end_tag() {
        let applied = run(
            "<div><img src=\"a.png\"/></div>",
            "<img",
            ElementEdit {
                tag_name: Some("p".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<div><p src=\"a.png\"></p></div>");
    }

    #[test]
    fn morph_into_void_is_ignored() {
        let applied = run(
            "<p>x</p>",
            "<p",
            ElementEdit {
                tag_name: Some("br".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<p>x</p>");
        assert_eq!(applied.ignored[0].field, "tagName");
    }

    #[test]
    fn invalid_tag_name_fails() {
        let html = "<p>x</p>";
        let edit = ElementEdit {
            tag_name: Some("h1 onclick=alert(1)".into()),
            ..ElementEdit::default()
        };
        assert!(matches!(
            apply_fields(html, 0, &edit),
            Err(MutationError::InvalidTagName { .. })
        ));
    }

    #[test]
    fn text_is_escaped_with_line_breaks() {
        let applied = run(
            "<td><p style=\"color:red\">old <i>text</i></p></td>",
            "<p",
            ElementEdit {
                text: Some("Fish & chips\n<today>".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            applied.html,
            "<td><p style=\"color:red\">Fish &amp; chips<br>&lt;today&gt;</p></td>"
        );
    }

    #[test]
    fn text_on_image_is_ignored() {
        let applied = run(
            "<img src=\"a.png\">",
            "<img",
            ElementEdit {
                text: Some("nope".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<img src=\"a.png\">");
        assert_eq!(
            applied.ignored,
            vec![UnsupportedField {
                field: "text",
                tag: "img".into()
            }]
        );
    }

    #[test]
    fn href_updates_parent_link() {
        let applied = run(
            "<a href=\"#\" class=\"btn\"><span>Go</span></a>",
            "<span",
            ElementEdit {
                href: Some("https://x.test/?a=1&b=2".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            applied.html,
            "<a href=\"https://x.test/?a=1&amp;b=2\" class=\"btn\"><span>Go</span></a>"
        );
        assert_eq!(&applied.html[applied.anchor..applied.anchor + 5], "<span");
    }

    #[test]
    fn href_wraps_plain_element() {
        let applied = run(
            "<td><span>Click</span></td>",
            "<span",
            ElementEdit {
                href: Some("https://x".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            applied.html,
            "<td><a href=\"https://x\"><span>Click</span></a></td>"
        );
        assert_eq!(&applied.html[applied.anchor..applied.anchor + 5], "<span");
    }

    #[test]
    fn wrapper_href_is_escaped() {
        let applied = run(
            "<td><img src=\"a.png\"></td>",
            "<img",
            ElementEdit {
                href: Some("https://x.test/?a=1&b=\"2\"".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            applied.html,
            "<td><a href=\"https://x.test/?a=1&amp;b=&quot;2&quot;\"><img src=\"a.png\"></a></td>"
        );
    }

    #[test]
    fn empty_href_does_not_wrap() {
        let applied = run(
            "<td><span>Click</span></td>",
            "<span",
            ElementEdit {
                href: Some(String::new()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<td><span>Click</span></td>");
    }

    #[test]
    fn src_and_alt_only_on_images() {
        let applied = run(
            "<p>x</p><img src=\"old.png\">",
            "<img",
            ElementEdit {
                src: Some("new.png".into()),
                alt: Some("New".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<p>x</p><img src=\"new.png\" alt=\"New\">");

        let applied = run(
            "<p>x</p>",
            "<p",
            ElementEdit {
                src: Some("new.png".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(applied.html, "<p>x</p>");
        assert_eq!(applied.ignored.len(), 1);
    }

    #[test]
    fn frame_sets_styles_and_attributes() {
        let applied = run(
            "<td><img src=\"a.png\" height=\"50\" style=\"max-width: 200px;\"></td>",
            "<img",
            ElementEdit {
                object_fit: Some(crate::mutation::ObjectFit::Contain),
                object_position: Some("20% 80%".into()),
                height: Some("auto".into()),
                width: Some("300px".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            applied.html,
            "<td><img src=\"a.png\" style=\"max-width: 200px; object-fit: contain; \
             object-position: 20% 80%; transform-origin: 20% 80%; height: auto; width: 300px;\" \
             width=\"300\"></td>"
        );
    }

    #[test]
    fn scale_clips_parent_and_neutral_scale_clears() {
        let scaled = run(
            "<td style=\"padding: 0\"><img src=\"a.png\"></td>",
            "<img",
            ElementEdit {
                scale: Some(2.0),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            scaled.html,
            "<td style=\"padding: 0; overflow: hidden; display: block;\">\
             <img src=\"a.png\" style=\"transform: scale(2);\"></td>"
        );

        let reset = run(
            &scaled.html,
            "<img",
            ElementEdit {
                scale: Some(1.0),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            reset.html,
            "<td style=\"padding: 0; overflow: hidden; display: block;\"><img src=\"a.png\"></td>"
        );
    }

    #[test]
    fn rejects_declarations_smuggled_into_frame_values() {
        let html = "<div><img src=\"a.png\"></div>";
        for (edit, field) in [
            (
                ElementEdit {
                    object_position: Some("10% 10%; position: fixed".into()),
                    ..ElementEdit::default()
                },
                "objectPosition",
            ),
            (
                ElementEdit {
                    width: Some("300px; position: fixed".into()),
                    ..ElementEdit::default()
                },
                "width",
            ),
        ] {
            match apply_fields(html, 5, &edit) {
                Err(MutationError::InvalidValue { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected invalid {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn crop_position_is_written_normalized() {
        let applied = run(
            "<div><img src=\"a.png\"></div>",
            "<img",
            ElementEdit {
                object_position: Some(" 12.50%   40% ".into()),
                ..ElementEdit::default()
            },
        );
        assert_eq!(
            applied.html,
            "<div><img src=\"a.png\" style=\"object-position: 12.5% 40%; transform-origin: 12.5% 40%;\"></div>"
        );
    }

    #[test]
    fn frame_on_paragraph_reports_every_field() {
        let html = "<div><p>x</p></div>";
        let edit = ElementEdit {
            object_fit: Some(crate::mutation::ObjectFit::Cover),
            object_position: Some("10% 10%".into()),
            height: Some("100px".into()),
            width: Some("auto".into()),
            scale: Some(2.0),
            ..ElementEdit::default()
        };
        let applied = apply_fields(html, 5, &edit).unwrap();

        assert_eq!(applied.html, html);
        let fields: Vec<_> = applied.ignored.iter().map(|f| f.field).collect();
        assert_eq!(fields, ["objectFit", "objectPosition", "height", "width", "scale"]);
        assert!(applied.ignored.iter().all(|f| f.tag == "p"));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let html = "<div><img src=\"a.png\"></div>";
        let edit = ElementEdit {
            scale: Some(0.0),
            ..ElementEdit::default()
        };
        assert!(matches!(
            apply_fields(html, 5, &edit),
            Err(MutationError::InvalidValue { field: "scale", .. })
        ));
    }
}
