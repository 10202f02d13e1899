//! Rubric evaluation against resolved styles and raw rules.

use serde::Serialize;

use super::compare::Patterns;
use super::model::{Assertion, Check, Expected, Rubric, RuleCheck};
use crate::css::shorthand::{expand, longhands_of};
use crate::css::{RuleInspector, StyleRule, declarations_containing};
use crate::error::Result;
use crate::style::ResolvedStyles;

/// Outcome of one rubric assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub passed: bool,
    /// The value that was compared, when there was one.
    pub actual: Option<String>,
    pub message: String,
}

struct Outcome {
    passed: bool,
    actual: Option<String>,
    message: String,
}

impl Outcome {
    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            actual: None,
            message: message.into(),
        }
    }
}

/// Evaluate every assertion of `rubric`, in order.
///
/// `rules` are the raw rules of the graded stylesheet, used by `rule`
/// assertions. Unsupported selectors and invalid patterns abort the run;
/// everything else becomes a failed [`AssertionResult`].
pub fn evaluate(
    resolved: &ResolvedStyles<'_>,
    rules: &[StyleRule],
    rubric: &Rubric,
) -> Result<Vec<AssertionResult>> {
    let mut patterns = Patterns::default();
    for assertion in &rubric.assertions {
        compile_patterns(&assertion.check, &mut patterns)?;
    }

    let evaluator = Evaluator {
        resolved,
        inspector: RuleInspector::new(rules),
        patterns,
    };
    rubric
        .assertions
        .iter()
        .map(|assertion| evaluator.assertion(assertion))
        .collect()
}

fn compile_patterns(check: &Check, patterns: &mut Patterns) -> Result<()> {
    match check {
        Check::Style { expected, .. } => patterns.add(expected),
        Check::Rule {
            check:
                RuleCheck::Declaration { expected, .. } | RuleCheck::DeclarationValues { expected, .. },
            ..
        } => patterns.add(expected),
        Check::Any { of } => of.iter().try_for_each(|c| compile_patterns(c, patterns)),
        _ => Ok(()),
    }
}

struct Evaluator<'r, 'd> {
    resolved: &'r ResolvedStyles<'d>,
    inspector: RuleInspector<'r>,
    patterns: Patterns,
}

impl Evaluator<'_, '_> {
    fn assertion(&self, assertion: &Assertion) -> Result<AssertionResult> {
        let span = tracing::debug_span!("assertion", id = %assertion.id);
        let _enter = span.enter();

        let outcome = self.check(&assertion.check)?;
        tracing::debug!(passed = outcome.passed, actual = ?outcome.actual, "{}", outcome.message);

        Ok(AssertionResult {
            id: assertion.id.clone(),
            description: assertion.description.clone(),
            passed: outcome.passed,
            actual: outcome.actual,
            message: outcome.message,
        })
    }

    fn check(&self, check: &Check) -> Result<Outcome> {
        match check {
            Check::Style {
                selector,
                index,
                property,
                expected,
            } => self.style(selector, index.unwrap_or(0), property, expected),
            Check::Rule { matcher, check } => {
                let matched = self.inspector.find(matcher);
                self.rule(&matched, check)
            }
            Check::Count {
                selector,
                attribute,
                op,
                count,
            } => {
                let document = self.resolved.document();
                let found = self
                    .resolved
                    .select(selector)?
                    .into_iter()
                    .filter(|&id| {
                        attribute
                            .as_ref()
                            .is_none_or(|a| a.matches(document.attr(id, &a.name)))
                    })
                    .count();
                let passed = op.test(found, *count);
                Ok(Outcome {
                    passed,
                    actual: Some(found.to_string()),
                    message: format!(
                        "{found} element(s) match `{selector}`, expected {op} {count}"
                    ),
                })
            }
            Check::MarkupDigest { expected } => {
                let digest = self.resolved.document().markup_digest();
                let passed = digest.eq_ignore_ascii_case(expected.trim());
                let message = if passed {
                    "markup is unchanged".to_string()
                } else {
                    format!("markup digest is {digest}, expected {expected}")
                };
                Ok(Outcome {
                    passed,
                    actual: Some(digest.to_string()),
                    message,
                })
            }
            Check::Any { of } => {
                let outcomes = of
                    .iter()
                    .map(|c| self.check(c))
                    .collect::<Result<Vec<_>>>()?;
                let winner = outcomes.iter().position(|o| o.passed);
                let message = outcomes
                    .iter()
                    .map(|o| o.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                Ok(match winner {
                    Some(i) => Outcome {
                        passed: true,
                        actual: outcomes[i].actual.clone(),
                        message: outcomes[i].message.clone(),
                    },
                    None => Outcome::fail(format!("no alternative passed: {message}")),
                })
            }
        }
    }

    fn style(
        &self,
        selector: &str,
        index: usize,
        property: &str,
        expected: &Expected,
    ) -> Result<Outcome> {
        let elements = self.resolved.select(selector)?;
        let Some(&element) = elements.get(index) else {
            return Ok(Outcome::fail(if elements.is_empty() {
                format!("no matching element for `{selector}`")
            } else {
                format!(
                    "no matching element for `{selector}` at index {index} ({} matched)",
                    elements.len()
                )
            }));
        };

        let actual = self.resolved.value(element, property).map(|v| v.into_owned());
        let passed = self.patterns.matches(expected, actual.as_deref())?;
        let message = match (&actual, passed) {
            (Some(value), true) => format!("`{property}` of `{selector}` is `{value}`"),
            (Some(value), false) => {
                let origin = self
                    .resolved
                    .style(element)
                    .and_then(|s| s.cascaded(property))
                    .map(|v| format!(" (from {})", v.origin))
                    .unwrap_or_default();
                format!(
                    "expected `{property}` of `{selector}` to be {expected}, found `{value}`{origin}"
                )
            }
            (None, true) => format!("`{property}` of `{selector}` is not set"),
            (None, false) => format!(
                "expected `{property}` of `{selector}` to be {expected}, but it is not set"
            ),
        };
        Ok(Outcome {
            passed,
            actual,
            message,
        })
    }

    fn rule(&self, matched: &[&StyleRule], check: &RuleCheck) -> Result<Outcome> {
        let count_outcome = |passed: bool, description: String| Outcome {
            passed,
            actual: Some(matched.len().to_string()),
            message: description,
        };

        match check {
            RuleCheck::Exists => Ok(count_outcome(
                !matched.is_empty(),
                format!("{} matching rule(s)", matched.len()),
            )),
            RuleCheck::Count { op, count } => Ok(count_outcome(
                op.test(matched.len(), *count),
                format!("{} matching rule(s), expected {op} {count}", matched.len()),
            )),
            RuleCheck::Declaration {
                property,
                expected,
                expand: expand_shorthands,
                position,
            } => {
                let Some(rule) = matched.first() else {
                    return Ok(Outcome::fail("no matching rule"));
                };
                let property = property.to_ascii_lowercase();
                let actual = match position {
                    Some(i) => rule
                        .declarations
                        .get(*i)
                        .filter(|d| d.property == property)
                        .map(|d| d.value.clone()),
                    // shorthands are only in the raw declarations
                    None if *expand_shorthands && longhands_of(&property).is_none() => expand(
                        rule.declarations
                            .iter()
                            .map(|d| (d.property.as_str(), d.value.as_str())),
                    )
                    .remove(&property),
                    None => rule
                        .declarations
                        .iter()
                        .rev()
                        .find(|d| d.property == property)
                        .map(|d| d.value.clone()),
                };
                let passed = self.patterns.matches(expected, actual.as_deref())?;
                let place = position
                    .map(|i| format!(" at position {i}"))
                    .unwrap_or_default();
                let message = match &actual {
                    Some(value) if passed => {
                        format!("`{property}: {value}`{place} in rule `{}`", rule.selector_text())
                    }
                    Some(value) => format!(
                        "expected `{property}`{place} in rule `{}` to be {expected}, found `{value}`",
                        rule.selector_text()
                    ),
                    None => format!(
                        "rule `{}` has no `{property}` declaration{place}",
                        rule.selector_text()
                    ),
                };
                Ok(Outcome {
                    passed,
                    actual,
                    message,
                })
            }
            RuleCheck::DeclarationValues {
                property_contains,
                expected,
            } => {
                let Some(rule) = matched.first() else {
                    return Ok(Outcome::fail("no matching rule"));
                };
                let values: Vec<&str> = declarations_containing(rule, property_contains)
                    .into_iter()
                    .map(|d| d.value.as_str())
                    .collect();
                let actual = (!values.is_empty()).then(|| values.join(" "));
                let passed = self.patterns.matches(expected, actual.as_deref())?;
                let message = match &actual {
                    Some(value) => format!(
                        "`*{property_contains}*` values in rule `{}` are `{value}`",
                        rule.selector_text()
                    ),
                    None => format!(
                        "rule `{}` declares no property containing `{property_contains}`",
                        rule.selector_text()
                    ),
                };
                Ok(Outcome {
                    passed,
                    actual,
                    message,
                })
            }
            RuleCheck::SelectorIncludes { text } => {
                let Some(rule) = matched.first() else {
                    return Ok(Outcome::fail("no matching rule"));
                };
                let selector = rule.selector_text();
                let passed = selector.contains(text.as_str());
                let message = if passed {
                    format!("selector `{selector}` includes `{text}`")
                } else {
                    format!("selector `{selector}` does not include `{text}`")
                };
                Ok(Outcome {
                    passed,
                    actual: Some(selector),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::Document;
    use crate::rubric::model::CountOp;
    use crate::style::resolve;
    use crate::util::markup_digest;
    use crate::Error;

    const HTML: &str = r#"<html><head>
        <link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Raleway">
        </head><body>
        <nav><a href="/">Home</a><a href="/about">About</a></nav>
        <p class="intro" style="color: red">Hello</p>
        <footer><p>one</p><p>two</p></footer>
        </body></html>"#;

    const CSS: &str = r#"
        body { font-family: 'Raleway', sans-serif; margin: 0 }
        p { color: blue; padding: .5rem 1rem }
        footer p:last-of-type { border-radius: 10px 10px 0 0 }
        nav a:hover, nav a:focus { text-decoration: underline }
        @media (max-width: 600px) { nav { display: none } }
    "#;

    fn run(rubric: &str) -> Result<Vec<AssertionResult>> {
        let doc = Document::parse(HTML);
        let sheet = Stylesheet::parse(CSS).unwrap();
        let resolved = resolve(&doc, &sheet).unwrap();
        evaluate(&resolved, sheet.rules(), &Rubric::from_json(rubric).unwrap())
    }

    fn passed(results: &[AssertionResult]) -> Vec<(&str, bool)> {
        results.iter().map(|r| (r.id.as_str(), r.passed)).collect()
    }

    #[test]
    fn test_style_assertions() {
        let results = run(r#"[
            {"id": "inline", "type": "style", "selector": "p.intro", "property": "color", "expected": "red"},
            {"id": "font", "type": "style", "selector": "body", "property": "font-family",
             "expected": {"mode": "pattern", "pattern": "raleway", "case_insensitive": true}},
            {"id": "radius", "type": "style", "selector": "footer p", "index": 1,
             "property": "border-bottom-left-radius", "expected": {"mode": "numeric", "value": 0, "unit": "px"}},
            {"id": "padding", "type": "style", "selector": "p", "property": "padding-top",
             "expected": {"mode": "numeric", "value": 0.5, "unit": "rem"}},
            {"id": "wrong", "type": "style", "selector": "p", "property": "color", "expected": "green"}
        ]"#)
        .unwrap();

        assert_eq!(
            passed(&results),
            vec![
                ("inline", true),
                ("font", true),
                ("radius", true),
                ("padding", true),
                ("wrong", false)
            ]
        );
        assert_eq!(results[4].actual.as_deref(), Some("red"));
        assert!(results[4].message.contains("style attribute"));
    }

    #[test]
    fn test_missing_element_fails() {
        let results = run(r#"[
            {"id": "a", "type": "style", "selector": "aside", "property": "color", "expected": {"mode": "present"}},
            {"id": "b", "type": "style", "selector": "footer p", "index": 5, "property": "color", "expected": "blue"}
        ]"#)
        .unwrap();

        assert!(results.iter().all(|r| !r.passed && r.actual.is_none()));
        assert!(results[0].message.contains("no matching element"));
        assert!(results[1].message.contains("no matching element"));
    }

    #[test]
    fn test_rule_assertions() {
        let results = run(r#"[
            {"id": "hover", "type": "rule", "match": {"selector_contains": ":hover"}, "check": "exists"},
            {"id": "focus", "type": "rule", "match": {"selector": "nav a:hover,nav  a:focus", "min_selectors": 2},
             "check": "declaration", "property": "text-decoration", "expected": "underline"},
            {"id": "media", "type": "rule", "match": {"at_rule": "media", "kind": "at-rule"},
             "check": "count", "op": "eq", "count": 1},
            {"id": "body-margin", "type": "rule", "match": {"selector": "body"},
             "check": "declaration", "property": "margin-left", "expand": true, "expected": "0"},
            {"id": "position", "type": "rule", "match": {"selector": "body"},
             "check": "declaration", "property": "font-family", "position": 0,
             "expected": {"mode": "pattern", "pattern": "^'Raleway'"}},
            {"id": "paddings", "type": "rule", "match": {"selector": "p"},
             "check": "declaration-values", "property_contains": "padding", "expected": ".5rem 1rem"},
            {"id": "includes", "type": "rule", "match": {"selector_contains": "last-of-type"},
             "check": "selector-includes", "text": "footer"},
            {"id": "absent", "type": "rule", "match": {"selector_contains": ":active"}, "check": "exists"}
        ]"#)
        .unwrap();

        assert_eq!(
            passed(&results),
            vec![
                ("hover", true),
                ("focus", true),
                ("media", true),
                ("body-margin", true),
                ("position", true),
                ("paddings", true),
                ("includes", true),
                ("absent", false)
            ]
        );
        assert_eq!(results[7].actual.as_deref(), Some("0"));
    }

    #[test]
    fn test_expanded_declaration_of_a_shorthand() {
        let results = run(r#"[
            {"id": "padding", "type": "rule", "match": {"selector": "p"},
             "check": "declaration", "property": "padding", "expand": true, "expected": ".5rem 1rem"},
            {"id": "padding-left", "type": "rule", "match": {"selector": "p"},
             "check": "declaration", "property": "padding-left", "expand": true, "expected": "1rem"}
        ]"#)
        .unwrap();
        assert_eq!(passed(&results), vec![("padding", true), ("padding-left", true)]);
    }

    #[test]
    fn test_escaped_unit_compares_without_panicking() {
        let doc = Document::parse("<p>x</p>");
        let sheet = Stylesheet::parse(r"p { width: 1\0\0\0; height: 2\70 x }").unwrap();
        let resolved = resolve(&doc, &sheet).unwrap();
        let rubric = Rubric::from_json(
            r#"[
            {"id": "width", "type": "style", "selector": "p", "property": "width",
             "expected": {"mode": "numeric", "value": 1, "unit": "px"}},
            {"id": "height", "type": "style", "selector": "p", "property": "height",
             "expected": {"mode": "numeric", "value": 2, "unit": "px"}}
        ]"#,
        )
        .unwrap();
        let results = evaluate(&resolved, sheet.rules(), &rubric).unwrap();
        assert_eq!(passed(&results), vec![("width", false), ("height", true)]);
    }

    #[test]
    fn test_declaration_without_matching_rule() {
        let results = run(r#"[{"id": "x", "type": "rule", "match": {"selector": "aside"},
            "check": "declaration", "property": "color", "expected": "red"}]"#)
        .unwrap();
        assert!(!results[0].passed);
        assert_eq!(results[0].message, "no matching rule");
    }

    #[test]
    fn test_count_markup_and_any() {
        let digest = markup_digest(HTML);
        let rubric = format!(
            r#"[
            {{"id": "font-link", "type": "count", "selector": "link",
              "attribute": {{"name": "href", "contains": "Raleway"}}, "op": "ge", "count": 1}},
            {{"id": "links", "type": "count", "selector": "nav a", "count": 2}},
            {{"id": "digest", "type": "markup-digest", "expected": "{digest}"}},
            {{"id": "either", "type": "any", "of": [
                {{"type": "style", "selector": "nav", "property": "display", "expected": "none"}},
                {{"type": "rule", "match": {{"selector_contains": "nav"}}, "check": "exists"}}
            ]}}
        ]"#
        );
        let results = run(&rubric).unwrap();
        assert_eq!(
            passed(&results),
            vec![("font-link", true), ("links", true), ("digest", true), ("either", true)]
        );
    }

    #[test]
    fn test_results_follow_rubric_order() {
        assert!(run("[]").unwrap().is_empty());

        let results = run(r#"[
            {"id": "z", "type": "count", "selector": "p", "count": 3},
            {"id": "a", "type": "count", "selector": "p", "op": "lt", "count": 1},
            {"id": "m", "type": "count", "selector": "p", "op": "ne", "count": 0}
        ]"#)
        .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
        assert_eq!(CountOp::Lt.to_string(), "<");
    }

    #[test]
    fn test_structural_errors_abort() {
        let err = run(r#"[{"id": "x", "type": "style", "selector": "a:hover",
            "property": "color", "expected": "red"}]"#)
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedSelector { .. }));

        // the bad pattern is reported even though its selector matches nothing
        let err = run(r#"[{"id": "x", "type": "style", "selector": "aside",
            "property": "color", "expected": {"mode": "pattern", "pattern": "[a-"}}]"#)
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
