use prism_editor::config::{load_from_path, run_script, ScriptResult};
use prism_editor::validate::pooled;
use std::fs;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

#[test]
fn welcome_script_matches_golden() {
    let input = load_fixture("welcome.html");
    let expected = load_fixture("welcome.expected.html");
    let script = load_from_path("tests/fixtures/welcome.toml").expect("script");

    let report = run_script(&input, &script);

    assert!(report.is_success(), "results: {:?}", report.results);
    assert_eq!(report.applied(), 5);
    assert_eq!(report.html, expected);
    pooled::validate(&report.html).expect("output parses cleanly");
}

#[test]
fn welcome_logo_is_found_through_new_link() {
    let input = load_fixture("welcome.html");
    let script = load_from_path("tests/fixtures/welcome.toml").expect("script");

    let report = run_script(&input, &script);

    let recovered: Vec<_> = report
        .results
        .iter()
        .filter_map(|r| match r {
            ScriptResult::Applied {
                id,
                recovered: true,
                ..
            } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(recovered, ["logo-height"]);
}

#[test]
fn newsletter_script_matches_golden() {
    let input = load_fixture("newsletter.html");
    let expected = load_fixture("newsletter.expected.html");
    let script = load_from_path("tests/fixtures/newsletter.toml").expect("script");

    let report = run_script(&input, &script);

    assert_eq!(report.applied(), 3);
    assert_eq!(report.already_applied(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.html, expected);

    let failed = report.results.last().unwrap();
    assert_eq!(failed.id(), "sidebar");
    assert!(failed.to_string().contains("/table[1]/tr[9]/td[1]"));
}

#[test]
fn rerunning_a_script_changes_nothing() {
    let input = load_fixture("newsletter.expected.html");
    let script = load_from_path("tests/fixtures/newsletter.toml").expect("script");

    let report = run_script(&input, &script);

    assert_eq!(report.html, input);
    assert_eq!(report.applied(), 0);
}

#[test]
fn fixtures_parse_without_errors() {
    for name in ["welcome.html", "newsletter.html", "flash_sale.html"] {
        let html = load_fixture(name);
        pooled::validate(&html).unwrap_or_else(|err| panic!("{name}: {err}"));
    }
}
