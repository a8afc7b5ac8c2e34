//! Properties every edit must keep, checked against real templates and
//! generated documents.

use prism_editor::address::Address;
use prism_editor::html::HtmlParser;
use prism_editor::mutation::{
    apply, AttributeField, ElementEdit, FieldEdit, ImageFrame, MutationStatus, SizingMode,
};
use prism_editor::selection::{extract_at, list_editable, DeclaredMetrics, MeasuredMetrics};
use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

fn frame(frame: ImageFrame) -> ElementEdit {
    FieldEdit::Frame(frame).into()
}

#[test]
fn empty_edit_leaves_every_element_untouched() {
    for name in ["welcome.html", "newsletter.html", "flash_sale.html"] {
        let html = load_fixture(name);
        let elements = list_editable(&html).unwrap();
        assert!(!elements.is_empty(), "{name} has editable elements");

        for element in elements {
            let outcome = apply(&html, &element.address.to_string(), &ElementEdit::new());
            assert!(
                matches!(outcome.status, MutationStatus::Unchanged),
                "{name} {}",
                element.address
            );
            assert_eq!(outcome.html, html);
        }
    }
}

#[test]
fn image_frame_is_idempotent() {
    let html = load_fixture("flash_sale.html");
    let address = "/div[1]/div[1]/img[1]";
    let edit = frame(ImageFrame {
        object_fit: Some("cover".parse().unwrap()),
        object_position: Some("25% 75%".into()),
        height: Some("240px".into()),
        width: Some("auto".into()),
        scale: Some(1.8),
    });

    let first = apply(&html, address, &edit);
    assert!(first.is_applied());
    let second = apply(&first.html, address, &edit);

    assert!(matches!(second.status, MutationStatus::Unchanged));
    assert_eq!(second.html, first.html);
}

#[test]
fn morph_happens_before_text() {
    let html = "<html><body><div><P>Hello</P></div></body></html>";
    let edit = ElementEdit::new()
        .with(FieldEdit::Morph("H1".into()))
        .with(FieldEdit::Text("Hi".into()));

    let outcome = apply(html, "/div[1]/p[1]", &edit);

    assert_eq!(outcome.html, "<html><body><div><h1>Hi</h1></div></body></html>");
    let address = outcome.address().expect("new address").to_string();
    assert_eq!(address, "/div[1]/h1[1]");

    let descriptor = extract_at(&outcome.html, &address, &DeclaredMetrics).unwrap();
    assert_eq!(descriptor.tag_name, "h1");
    assert_eq!(descriptor.text, "Hi");
}

#[test]
fn href_wraps_once_then_updates_the_wrapper() {
    let html = "<html><body><div><SPAN>Click</SPAN></div></body></html>";
    let link =
        |href: &str| ElementEdit::from(FieldEdit::Attribute(AttributeField::Href, href.into()));

    let wrapped = apply(html, "/div[1]/span[1]", &link("https://x"));
    assert_eq!(
        wrapped.html,
        "<html><body><div><a href=\"https://x\"><SPAN>Click</SPAN></a></div></body></html>"
    );
    assert_eq!(wrapped.address().unwrap().to_string(), "/div[1]/a[1]/span[1]");

    let updated = apply(&wrapped.html, "/div[1]/span[1]", &link("https://y"));
    assert!(matches!(
        updated.status,
        MutationStatus::Applied {
            recovered: true,
            ..
        }
    ));
    assert_eq!(
        updated.html,
        "<html><body><div><a href=\"https://y\"><SPAN>Click</SPAN></a></div></body></html>"
    );
}

#[test]
fn zoom_clips_parent_and_neutral_scale_clears_it() {
    let html = "<html><body><div><img src=\"p.png\"></div></body></html>";
    let zoom = |scale: f64| {
        frame(ImageFrame {
            scale: Some(scale),
            ..ImageFrame::default()
        })
    };

    let zoomed = apply(html, "/div[1]/img[1]", &zoom(2.0));
    assert_eq!(
        zoomed.html,
        "<html><body><div style=\"overflow: hidden; display: block;\">\
         <img src=\"p.png\" style=\"transform: scale(2);\"></div></body></html>"
    );

    let reset = apply(&zoomed.html, "/div[1]/img[1]", &zoom(1.0));
    assert!(!reset.html.contains("transform"));
    assert!(reset.html.contains("<img src=\"p.png\">"));
}

#[test]
fn fit_then_fill() {
    let html = "<html><body><div><img src=\"p.png\"></div></body></html>";
    let rendered = MeasuredMetrics {
        width: Some(300.0),
        height: Some(200.0),
    };

    let before = extract_at(html, "/div[1]/img[1]", &rendered).unwrap();
    let fit = apply(html, "/div[1]/img[1]", &frame(SizingMode::Fit.frame(&before)));
    assert!(fit.html.contains(
        "<img src=\"p.png\" height=\"200\" width=\"300\" style=\"object-fit: contain; height: 200px; width: 300px;\">"
    ));

    let after_fit = extract_at(&fit.html, "/div[1]/img[1]", &DeclaredMetrics).unwrap();
    assert_eq!(after_fit.sizing_mode(), Some(SizingMode::Fit));

    let fill = apply(&fit.html, "/div[1]/img[1]", &frame(SizingMode::Fill.frame(&after_fit)));
    assert!(fill.html.contains(
        "<img src=\"p.png\" width=\"300\" style=\"object-fit: cover; height: auto; width: 300px;\">"
    ));

    let after_fill = extract_at(&fill.html, "/div[1]/img[1]", &DeclaredMetrics).unwrap();
    assert_eq!(after_fill.sizing_mode(), Some(SizingMode::Fill));
    assert_eq!(after_fill.computed_width.as_deref(), Some("300px"));
}

#[test]
fn browser_style_tbody_steps_resolve() {
    let html = load_fixture("newsletter.html");
    let direct = extract_at(&html, "/table[1]/tr[2]/td[1]/h2[1]", &DeclaredMetrics).unwrap();
    let via_tbody =
        extract_at(&html, "/table[1]/tbody[1]/tr[2]/td[1]/h2[1]", &DeclaredMetrics).unwrap();

    assert_eq!(direct.text, "Monthly Insights");
    assert_eq!(via_tbody, direct);
}

const TAGS: [&str; 5] = ["div", "span", "b", "em", "section"];

/// Copy-pasted email markup often repeats ids, so some elements share one.
fn arb_open_tag() -> impl Strategy<Value = (&'static str, &'static str)> {
    (
        prop::sample::select(TAGS.to_vec()),
        prop::sample::select(vec!["", "", " id=\"dup\"", " id=\"hero\""]),
    )
}

fn arb_markup() -> impl Strategy<Value = String> {
    let leaf = arb_open_tag().prop_map(|(tag, id)| format!("<{tag}{id}>x</{tag}>"));
    leaf.prop_recursive(4, 48, 6, |inner| {
        (arb_open_tag(), prop::collection::vec(inner, 1..6)).prop_map(|((tag, id), children)| {
            format!("<{tag}{id}>{}</{tag}>", children.concat())
        })
    })
}

proptest! {
    #[test]
    fn addresses_are_unique_and_resolve_back(
        blocks in prop::collection::vec(arb_markup(), 1..5)
    ) {
        let html = format!("<html><body>{}</body></html>", blocks.concat());
        let mut parser = HtmlParser::new().unwrap();
        let parsed = parser.parse_with_source(&html).unwrap();
        let root = parsed.content_root();

        let mut seen = HashSet::new();
        for element in parsed.elements() {
            if element.is("html") || element.is("body") {
                continue;
            }
            let address = Address::encode(&element, &root);
            prop_assert!(seen.insert(address.to_string()), "duplicate address {}", address);

            let found = address.locate(&parsed);
            prop_assert_eq!(found.map(|el| el.start_byte()), Some(element.start_byte()));
        }
    }
}
