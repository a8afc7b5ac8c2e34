//! Snapshot, cancel and save across whole templates.

use prism_editor::mutation::{ElementEdit, FieldEdit, ImageFrame, ObjectFit};
use prism_editor::session::{EditSession, SessionError, SessionPolicy};
use prism_editor::suggest::AiAction;
use std::fs;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

const HEADLINE: &str = "/table[1]/tr[2]/td[1]/table[1]/tr[1]/td[1]/h1[1]";
const LOGO: &str = "/table[1]/tr[1]/td[1]/img[1]";

#[test]
fn cancel_after_two_edits_returns_original() {
    let original = load_fixture("welcome.html");
    let mut session = EditSession::new(original.clone());

    session.select(HEADLINE).unwrap();
    let first = session
        .update(&FieldEdit::Text("Hello there".into()).into())
        .unwrap();
    let second = session
        .update(&FieldEdit::Morph("h2".into()).into())
        .unwrap();

    assert_ne!(first.html, original);
    assert_ne!(second.html, first.html);
    assert_eq!(session.document(), second.html);

    assert_eq!(session.cancel(), original);
    assert!(session.selection().is_none());
}

#[test]
fn save_commits_and_next_selection_snapshots_saved_text() {
    let original = load_fixture("welcome.html");
    let mut session = EditSession::new(original.clone());

    session.select(LOGO).unwrap();
    session
        .update(&ElementEdit {
            href: Some("https://prism.example".into()),
            ..ElementEdit::default()
        })
        .unwrap();
    assert_eq!(
        session.selection().unwrap().address.to_string(),
        "/table[1]/tr[1]/td[1]/a[1]/img[1]"
    );
    let saved = session.save().to_string();

    // The stale address still finds the logo through the new link.
    let descriptor = session.select(LOGO).unwrap();
    assert_eq!(descriptor.href.as_deref(), Some("https://prism.example"));
    session
        .update(
            &FieldEdit::Frame(ImageFrame {
                object_fit: Some(ObjectFit::Contain),
                ..ImageFrame::default()
            })
            .into(),
        )
        .unwrap();

    assert_eq!(session.snapshot(), Some(saved.as_str()));
    assert_eq!(session.cancel(), saved);
    assert_ne!(saved, original);
}

#[test]
fn restore_then_open_rolls_back_previous_selection() {
    let original = load_fixture("newsletter.html");
    let mut session = EditSession::new(original.clone());

    session.select("/table[1]/tr[2]/td[1]/h2[1]").unwrap();
    session
        .update(&FieldEdit::Text("Quarterly Insights".into()).into())
        .unwrap();

    session.select("/table[1]/tr[3]/td[1]/p[1]").unwrap();
    assert_eq!(session.document(), original);
}

#[test]
fn require_close_keeps_working_copy_intact() {
    let original = load_fixture("newsletter.html");
    let mut session = EditSession::new(original).with_policy(SessionPolicy::RequireClose);

    session.select("/table[1]/tr[2]/td[1]/h2[1]").unwrap();
    session
        .update(&FieldEdit::Text("Quarterly Insights".into()).into())
        .unwrap();
    let working = session.document().to_string();

    let err = session.select("/table[1]/tr[3]/td[1]/p[1]").unwrap_err();
    assert!(matches!(err, SessionError::SelectionOpen { .. }));
    assert_eq!(session.document(), working);
}

#[test]
fn failed_update_leaves_working_copy() {
    let original = load_fixture("flash_sale.html");
    let mut session = EditSession::new(original.clone());

    session.select("/div[1]/div[1]/img[1]").unwrap();
    let err = session
        .update(&FieldEdit::Morph("not a tag".into()).into())
        .unwrap_err();

    assert!(matches!(err, SessionError::Edit(_)));
    assert_eq!(session.document(), original);
    assert!(session.is_open());
}

#[test]
fn suggestion_rewrites_text_and_cancel_discards_it() {
    let original = load_fixture("flash_sale.html");
    let mut session = EditSession::new(original.clone());

    session.select("/div[1]/h1[1]").unwrap();
    let shout = |text: &str, _: AiAction, _: Option<&str>| text.to_uppercase();
    session
        .apply_suggestion(AiAction::RewriteFriendly, &shout)
        .unwrap();

    assert!(session.document().contains(">FLASH SALE!</h1>"));
    assert_eq!(session.cancel(), original);
}
