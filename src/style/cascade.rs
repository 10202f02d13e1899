//! CSS cascade implementation.
//!
//! Resolves which declarations apply to an element from importance,
//! inline origin, specificity and source order.

use selectors::context::SelectorCaches;

use super::computed::{ComputedStyle, ValueOrigin};
use crate::css::selector::{has_dynamic_state, has_pseudo_element};
use crate::css::{Declaration, Specificity, Stylesheet};
use crate::dom::{ElementRef, matches_selector};

/// A matched declaration with ordering information for the cascade.
#[derive(Debug)]
struct MatchedDeclaration<'a> {
    declaration: &'a Declaration,
    origin: ValueOrigin,
    specificity: Specificity,
    inline: bool,
    order: usize,
}

/// Compute the cascaded style of one element.
///
/// `sheets` are in cascade order; rules inside a conditional at-rule are
/// skipped. Selectors are filtered one by one: those with a dynamic
/// pseudo-class or a pseudo-element never apply, the rest of the list
/// does. A rule's specificity for the element is that of its most specific
/// matching selector.
pub(crate) fn cascade_element(
    elem: ElementRef<'_>,
    sheets: &[&Stylesheet],
    inline: &[Declaration],
    caches: &mut SelectorCaches,
) -> ComputedStyle {
    let mut matched: Vec<MatchedDeclaration> = Vec::with_capacity(16);
    let mut order = 0;

    for (sheet_index, sheet) in sheets.iter().enumerate() {
        for rule in sheet.rules().iter().filter(|r| r.is_static()) {
            let specificity = rule
                .compiled_selectors()
                .iter()
                .filter(|selector| {
                    !has_dynamic_state(selector)
                        && !has_pseudo_element(selector)
                        && matches_selector(selector, elem, caches)
                })
                .map(Specificity::from_selector)
                .max();
            let Some(specificity) = specificity else {
                continue;
            };

            let origin = ValueOrigin::Rule {
                sheet: sheet_index,
                selector: rule.selector_text(),
                position: rule.position,
            };
            for declaration in &rule.declarations {
                matched.push(MatchedDeclaration {
                    declaration,
                    origin: origin.clone(),
                    specificity,
                    inline: false,
                    order,
                });
                order += 1;
            }
        }
    }

    for declaration in inline {
        matched.push(MatchedDeclaration {
            declaration,
            origin: ValueOrigin::Inline,
            specificity: Specificity::default(),
            inline: true,
            order,
        });
        order += 1;
    }

    // `order` is unique, so the sort is total and deterministic.
    matched.sort_unstable_by(|a, b| {
        a.declaration
            .important
            .cmp(&b.declaration.important)
            .then(a.inline.cmp(&b.inline))
            .then(a.specificity.cmp(&b.specificity))
            .then(a.order.cmp(&b.order))
    });

    tracing::trace!(element = ?elem, declarations = matched.len(), "cascade");

    let mut style = ComputedStyle::default();
    for (seq, m) in matched.iter().enumerate() {
        style.apply(
            &m.declaration.property,
            &m.declaration.value,
            m.declaration.important,
            &m.origin,
            seq,
        );
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn cascade(html: &str, css: &str, tag: &str) -> ComputedStyle {
        let doc = Document::parse(html);
        let sheet = Stylesheet::parse(css).unwrap();
        let id = doc.find_by_tag(tag).unwrap();
        let inline = doc
            .attr(id, "style")
            .map(|s| Stylesheet::parse_inline(s).unwrap())
            .unwrap_or_default();
        let mut caches = SelectorCaches::default();
        cascade_element(ElementRef::new(&doc, id), &[&sheet], &inline, &mut caches)
    }

    #[test]
    fn test_specificity_beats_source_order() {
        let style = cascade(
            r#"<p id="x" class="c">t</p>"#,
            "#x { color: red } .c { color: blue } p { color: green }",
            "p",
        );
        assert_eq!(style.get("color").as_deref(), Some("red"));
    }

    #[test]
    fn test_source_order_breaks_ties() {
        let style = cascade(
            r#"<p class="a b">t</p>"#,
            ".a { color: red } .b { color: blue }",
            "p",
        );
        assert_eq!(style.get("color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_important_beats_specificity_and_inline() {
        let style = cascade(
            r#"<p id="x" style="color: green">t</p>"#,
            "#x { color: red } p { color: blue !important }",
            "p",
        );
        assert_eq!(style.get("color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_inline_important_beats_sheet_important() {
        let style = cascade(
            r#"<p style="color: green !important">t</p>"#,
            "p { color: blue !important }",
            "p",
        );
        assert_eq!(style.get("color").as_deref(), Some("green"));
    }

    #[test]
    fn test_most_specific_matching_selector_counts() {
        // `#x, div` matches through #x; `.c` loses even though it comes later
        let style = cascade(
            r#"<p id="x" class="c">t</p>"#,
            "#x, div { color: red } .c { color: blue }",
            "p",
        );
        assert_eq!(style.get("color").as_deref(), Some("red"));
    }

    #[test]
    fn test_dynamic_and_conditional_rules_ignored() {
        let style = cascade(
            r#"<a href="/">t</a>"#,
            "a { color: blue } a:hover { color: red } @media print { a { color: black } }",
            "a",
        );
        assert_eq!(style.get("color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_static_selector_in_mixed_list_applies() {
        let html = r#"<nav><p>t</p><a class="active" href="/">a</a></nav>"#;
        let css = "p { color: blue } a:hover, p { color: red } \
                   nav a:hover, nav a.active { color: green }";
        assert_eq!(cascade(html, css, "p").get("color").as_deref(), Some("red"));
        assert_eq!(cascade(html, css, "a").get("color").as_deref(), Some("green"));

        // specificity comes from the static selector only
        let style = cascade(
            r#"<a id="home" class="btn">t</a>"#,
            "#home:focus, .btn { color: red } a.btn { color: blue }",
            "a",
        );
        assert_eq!(style.get("color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_pseudo_element_selectors_do_not_style_the_element() {
        let style = cascade("<p>t</p>", "p { color: blue } p::before { color: red }", "p");
        assert_eq!(style.get("color").as_deref(), Some("blue"));
    }

    #[test]
    fn test_shorthand_merge_at_longhand_granularity() {
        let style = cascade(
            "<section>t</section>",
            "section { margin-top: 5px } section { margin: 0 }",
            "section",
        );
        assert_eq!(style.get("margin-top").as_deref(), Some("0"));

        let style = cascade(
            "<section>t</section>",
            "section { margin: 1rem } section { margin-top: 5px }",
            "section",
        );
        assert_eq!(style.get("margin-top").as_deref(), Some("5px"));
        assert_eq!(style.get("margin-right").as_deref(), Some("1rem"));
    }

    #[test]
    fn test_origin_recorded() {
        let style = cascade("<p>t</p>", "\n\np { color: red }", "p");
        match &style.cascaded("color").unwrap().origin {
            ValueOrigin::Rule {
                selector, position, ..
            } => {
                assert_eq!(selector, "p");
                assert_eq!(position.line, 3);
            }
            other => panic!("unexpected origin: {other:?}"),
        }
    }
}
