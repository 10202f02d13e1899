//! Markup document model.
//!
//! - [`arena`]: arena-allocated tree
//! - [`tree_sink`]: html5ever builds the tree through it
//! - [`element_ref`]: selector matching against the tree

mod arena;
mod element_ref;
mod tree_sink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::parser::Selector;

pub use arena::{Attribute, Children, Document, Elements, Node, NodeData, NodeId};
pub use element_ref::{ElementRef, GradeSelectors, NonTSPseudoClass, PseudoElement};

use crate::css::selector::parse_query_selector;
use crate::error::Result;
use crate::util::markup_digest;

impl Document {
    /// Parse markup the way a browser would; html5ever never rejects input.
    pub fn parse(html: &str) -> Self {
        let sink = tree_sink::ArenaSink::new();
        let mut doc = parse_document(sink, ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_document();
        doc.digest = markup_digest(html);
        tracing::debug!(nodes = doc.len(), "parsed markup");
        doc
    }

    /// All elements matching a selector list, in document order.
    ///
    /// Fails with [`Error::UnsupportedSelector`](crate::Error::UnsupportedSelector)
    /// when the selector depends on dynamic state (`:hover`, ...) or uses a
    /// pseudo-class the matcher does not know.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selectors = parse_query_selector(selector)?;
        let mut caches = SelectorCaches::default();
        Ok(self
            .elements()
            .filter(|&id| {
                selectors
                    .iter()
                    .any(|s| matches_selector(s, ElementRef::new(self, id), &mut caches))
            })
            .collect())
    }

    /// Whether the element is a `<link>` with `stylesheet` among its rels.
    pub fn is_stylesheet_link(&self, id: NodeId) -> bool {
        self.element_name(id).is_some_and(|n| &**n == "link")
            && self.attr(id, "rel").is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("stylesheet"))
            })
    }
}

/// Match one compiled selector against an element.
pub(crate) fn matches_selector(
    selector: &Selector<GradeSelectors>,
    elem: ElementRef<'_>,
    caches: &mut SelectorCaches,
) -> bool {
    let mut context = MatchingContext::new(
        selectors::matching::MatchingMode::Normal,
        None,
        caches,
        selectors::context::QuirksMode::NoQuirks,
        selectors::matching::NeedsSelectorFlags::No,
        selectors::matching::MatchingForInvalidation::No,
    );
    selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn names(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| doc.element_name(id).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_select_by_tag_class_id() {
        let doc = Document::parse(
            r#"<div id="menu"><p class="intro">a</p><p>b</p></div><p class="intro">c</p>"#,
        );

        assert_eq!(doc.select("p").unwrap().len(), 3);
        assert_eq!(doc.select(".intro").unwrap().len(), 2);
        assert_eq!(doc.select("#menu .intro").unwrap().len(), 1);
        assert_eq!(doc.select("#menu > p").unwrap().len(), 2);
        assert!(doc.select("section").unwrap().is_empty());
    }

    #[test]
    fn test_select_structural_pseudo_classes() {
        let doc = Document::parse(
            "<footer><p>one</p><p>two</p><span>x</span></footer>",
        );

        let last = doc.select("footer p:last-of-type").unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(doc.text_content(last[0]), "two");

        let first = doc.select("footer :first-child").unwrap();
        assert_eq!(names(&doc, &first), vec!["p"]);

        let odd = doc.select("footer > :nth-child(odd)").unwrap();
        assert_eq!(names(&doc, &odd), vec!["p", "span"]);
    }

    #[test]
    fn test_select_svg_children() {
        let doc = Document::parse(
            r#"<svg><circle r="1"/><path d=""/><circle r="2"/><g><circle r="3"/></g></svg>"#,
        );

        let circles = doc.select("svg > circle").unwrap();
        assert_eq!(circles.len(), 2);
        assert_eq!(doc.attr(circles[1], "r"), Some("2"));
    }

    #[test]
    fn test_select_static_state() {
        let doc = Document::parse(
            r#"<a href="/x">x</a><a>y</a><input type="checkbox" checked><input disabled>"#,
        );

        assert_eq!(doc.select("a:link").unwrap().len(), 1);
        assert_eq!(doc.select("input:checked").unwrap().len(), 1);
        assert_eq!(doc.select("input:disabled").unwrap().len(), 1);
        assert_eq!(doc.select("input:enabled").unwrap().len(), 1);
    }

    #[test]
    fn test_select_rejects_dynamic_state() {
        let doc = Document::parse("<a href='#'>x</a>");
        let err = doc.select("a:hover").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSelector { .. }));

        let err = doc.select("a:blink").unwrap_err();
        assert!(matches!(err, Error::UnsupportedSelector { .. }));
    }

    #[test]
    fn test_stylesheet_links() {
        let doc = Document::parse(
            r#"<head>
                <link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Raleway">
                <link rel="icon" href="favicon.ico">
                <link rel="stylesheet" href="css/style.css">
            </head>"#,
        );

        let hrefs: Vec<_> = doc
            .elements()
            .filter(|&id| doc.is_stylesheet_link(id))
            .filter_map(|id| doc.attr(id, "href"))
            .collect();
        assert_eq!(
            hrefs,
            vec!["https://fonts.googleapis.com/css?family=Raleway", "css/style.css"]
        );
    }

    #[test]
    fn test_markup_digest_recorded() {
        let doc = Document::parse("<p>x</p>");
        assert_eq!(doc.markup_digest(), markup_digest("<p>\n  x</p>"));
    }
}
