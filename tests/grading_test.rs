//! End-to-end grading of the portfolio fixture.
//!
//! The fixture mirrors a typical front-end exercise: Google Fonts links,
//! a nav bar with hover/focus rules, shorthand spacing, a media query.

use std::fs;
use std::path::Path;

use stylegrade::report::{EXIT_FAILED, EXIT_PASSED};
use stylegrade::util::markup_digest;
use stylegrade::{
    Document, Error, MemoryLoader, ResolveOptions, Resolver, Rubric, Stylesheet, evaluate,
    file_url, grade, grade_files,
};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> String {
    format!("{}/{}", FIXTURES_DIR, name)
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("Failed to read fixture")
}

#[test]
fn test_portfolio_rubric() {
    let report = grade_files(
        fixture_path("portfolio/index.html"),
        fixture_path("portfolio/css/style.css"),
        fixture_path("portfolio/rubric.json"),
        ResolveOptions::default(),
    )
    .expect("Failed to grade fixture");

    assert_eq!(report.rubric.as_deref(), Some("portfolio"));
    assert_eq!(report.summary.total, 21);

    let failed: Vec<_> = report.failures().map(|r| r.id.as_str()).collect();
    assert_eq!(failed, vec!["sidebar"], "{report}");
    assert!(report.results[20].message.contains("no matching element"));
    assert_eq!(report.exit_code(), EXIT_FAILED);
}

#[test]
fn test_results_in_rubric_order() {
    let rubric = Rubric::from_json(&fixture("portfolio/rubric.json")).unwrap();
    let report = grade(
        &fixture("portfolio/index.html"),
        &fixture("portfolio/css/style.css"),
        &rubric,
    )
    .unwrap();

    let expected: Vec<_> = rubric.assertions.iter().map(|a| a.id.as_str()).collect();
    let actual: Vec<_> = report.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_empty_rubric_passes() {
    let report = grade(
        &fixture("portfolio/index.html"),
        &fixture("portfolio/css/style.css"),
        &Rubric::default(),
    )
    .unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.exit_code(), EXIT_PASSED);
}

#[test]
fn test_linked_stylesheet_from_disk() {
    // The markup links css/style.css itself; with link tags on, an empty
    // supplied sheet still yields the fixture's styles.
    let html_path = fixture_path("portfolio/index.html");
    let options = ResolveOptions::default()
        .with_base_url(file_url(Path::new(&html_path)).unwrap())
        .with_link_tags(true);
    let loader = stylegrade::FileLoader;
    let resolver = Resolver::new(options).with_loader(&loader);

    let doc = Document::parse(&fixture("portfolio/index.html"));
    let resolved = resolver.resolve(&doc, &Stylesheet::default()).unwrap();

    // fonts.googleapis.com links are skipped, the local sheet is applied
    assert_eq!(resolved.sources().len(), 2);
    assert_eq!(
        resolved.effective_value("nav", "position").unwrap().as_deref(),
        Some("fixed")
    );

    let header = resolved.select("header").unwrap()[0];
    let urls = resolved.resource_urls(header, "background-image").unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].path().ends_with("/tests/fixtures/portfolio/img/hero.jpg"));
}

#[test]
fn test_markup_digest_detects_edits() {
    let html = fixture("portfolio/index.html");
    let rubric = Rubric::from_json(&format!(
        r#"[{{"id": "unchanged", "type": "markup-digest", "expected": "{}"}}]"#,
        markup_digest(&html)
    ))
    .unwrap();

    let reindented = html.replace("  ", "\t");
    let report = grade(&reindented, "", &rubric).unwrap();
    assert!(report.passed());

    let edited = html.replace("Ada Lovelace", "Charles Babbage");
    let report = grade(&edited, "", &rubric).unwrap();
    assert!(!report.passed());
}

#[test]
fn test_imports_through_memory_loader() {
    let loader = MemoryLoader::new()
        .with(
            "https://course.test/a/css/style.css",
            "@import url('reset.css'); h1 { color: teal }",
        )
        .unwrap()
        .with(
            "https://course.test/a/css/reset.css",
            "h1 { margin: 0; color: black }",
        )
        .unwrap();
    let doc = Document::parse(r#"<link rel="stylesheet" href="css/style.css"><h1>x</h1>"#);
    let options = ResolveOptions::default()
        .with_base_url("https://course.test/a/index.html".parse().unwrap())
        .with_link_tags(true);
    let resolved = Resolver::new(options)
        .with_loader(&loader)
        .resolve(&doc, &Stylesheet::default())
        .unwrap();

    let rubric = Rubric::from_json(
        r#"[
            {"id": "color", "type": "style", "selector": "h1", "property": "color", "expected": "teal"},
            {"id": "margin", "type": "style", "selector": "h1", "property": "margin-bottom",
             "expected": {"mode": "numeric", "value": 0, "unit": "px"}}
        ]"#,
    )
    .unwrap();
    let results = evaluate(&resolved, &[], &rubric).unwrap();
    assert!(results.iter().all(|r| r.passed), "{results:?}");
}

#[test]
fn test_fatal_errors() {
    let rubric = Rubric::default();

    let err = grade("<p>x</p>", "p { color: ; }", &rubric).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 1, .. }));

    let err = grade("<p>x</p>", "p:blink { color: red }", &rubric).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSelector { .. }));

    let rubric = Rubric::from_json(
        r#"[{"id": "x", "type": "style", "selector": "p:focus", "property": "color", "expected": "red"}]"#,
    )
    .unwrap();
    let err = grade("<p>x</p>", "", &rubric).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSelector { .. }));
}

#[test]
fn test_malformed_rubric() {
    assert!(matches!(
        Rubric::from_json(r#"{"assertions": [{"id": 1}]}"#),
        Err(Error::Rubric(_))
    ));
}
