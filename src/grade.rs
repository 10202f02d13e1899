//! Parse, resolve and evaluate in one call.

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

#[cfg(not(target_arch = "wasm32"))]
use url::Url;

use crate::css::Stylesheet;
use crate::dom::Document;
use crate::error::Result;
use crate::report::Report;
use crate::rubric::{Rubric, evaluate};
use crate::style::{ResolveOptions, Resolver};

#[cfg(not(target_arch = "wasm32"))]
use crate::{error::Error, resource::FileLoader, util::read_text_file};

/// Grade markup and a stylesheet with default resolution options.
pub fn grade(html: &str, css: &str, rubric: &Rubric) -> Result<Report> {
    grade_with(&Resolver::new(ResolveOptions::default()), html, css, rubric)
}

/// Grade with a configured [`Resolver`]; `rule` assertions inspect the
/// rules of `css` only.
pub fn grade_with(resolver: &Resolver<'_>, html: &str, css: &str, rubric: &Rubric) -> Result<Report> {
    grade_stylesheet(resolver, html, &Stylesheet::parse(css)?, rubric)
}

fn grade_stylesheet(
    resolver: &Resolver<'_>,
    html: &str,
    stylesheet: &Stylesheet,
    rubric: &Rubric,
) -> Result<Report> {
    let document = Document::parse(html);
    let resolved = resolver.resolve(&document, stylesheet)?;
    let results = evaluate(&resolved, stylesheet.rules(), rubric)?;

    let report = Report::new(rubric.name.clone(), results);
    tracing::info!(
        passed = report.summary.passed,
        failed = report.summary.failed,
        "graded submission"
    );
    Ok(report)
}

/// Grade files on disk.
///
/// Without a base URL in `options`, references resolve against the markup
/// file's location. Linked stylesheets, when enabled, load from disk.
/// Parse errors in the stylesheet name its path.
#[cfg(not(target_arch = "wasm32"))]
pub fn grade_files(
    html: impl AsRef<Path>,
    css: impl AsRef<Path>,
    rubric: impl AsRef<Path>,
    mut options: ResolveOptions,
) -> Result<Report> {
    let (html_path, css_path) = (html.as_ref(), css.as_ref());
    let rubric = Rubric::from_json(&read_text_file(rubric)?)?;
    let html = read_text_file(html_path)?;
    let stylesheet = Stylesheet::parse(&read_text_file(css_path)?)
        .map_err(|e| e.in_source(&css_path.display().to_string()))?;

    if options.base_url.is_none() {
        options.base_url = Some(file_url(html_path)?);
    }
    let loader = FileLoader;
    let resolver = Resolver::new(options).with_loader(&loader);
    grade_stylesheet(&resolver, &html, &stylesheet, &rubric)
}

/// `file:` URL of a path on disk.
#[cfg(not(target_arch = "wasm32"))]
pub fn file_url(path: &Path) -> Result<Url> {
    let absolute = path.canonicalize()?;
    Url::from_file_path(&absolute)
        .map_err(|()| Error::Resolution(format!("cannot express {} as a URL", absolute.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_in_memory() {
        let rubric = Rubric::from_json(
            r#"[{"id": "c", "type": "style", "selector": "p", "property": "color", "expected": "red"}]"#,
        )
        .unwrap();
        let report = grade(r#"<p style="color:red">x</p>"#, "p { color: blue; }", &rubric).unwrap();
        assert!(report.passed());
        assert_eq!(report.summary.total, 1);
    }

    #[test]
    fn test_grade_stylesheet_error_is_fatal() {
        let err = grade("<p>x</p>", "p { color: }", &Rubric::default()).unwrap_err();
        assert!(matches!(err, crate::Error::Parse { .. }));
    }

    #[test]
    fn test_grade_files_resolves_links_next_to_markup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            r#"<link rel="stylesheet" href="css/base.css"><h1>x</h1>"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("css/base.css"), "h1 { font-size: 2em }").unwrap();
        std::fs::write(dir.path().join("style.css"), "h1 { color: navy }").unwrap();
        std::fs::write(
            dir.path().join("rubric.json"),
            r#"[{"id": "size", "type": "style", "selector": "h1", "property": "font-size",
                 "expected": {"mode": "numeric", "value": 2, "unit": "em"}}]"#,
        )
        .unwrap();

        let report = grade_files(
            dir.path().join("index.html"),
            dir.path().join("style.css"),
            dir.path().join("rubric.json"),
            ResolveOptions::default().with_link_tags(true),
        )
        .unwrap();
        assert!(report.passed(), "{report}");
    }

    #[test]
    fn test_grade_files_names_the_stylesheet_in_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>x</p>").unwrap();
        std::fs::write(dir.path().join("style.css"), "p {\n  color: ;\n}").unwrap();
        std::fs::write(dir.path().join("rubric.json"), "[]").unwrap();

        let err = grade_files(
            dir.path().join("index.html"),
            dir.path().join("style.css"),
            dir.path().join("rubric.json"),
            ResolveOptions::default(),
        )
        .unwrap_err();
        match err {
            crate::Error::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("style.css"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
