//! Selector compilation, classification and specificity.

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, ToCss};
use selectors::parser::{
    Component, ParseRelative, Selector, SelectorList, SelectorParseErrorKind,
};
use selectors::visitor::SelectorVisitor;
use serde::Serialize;

use crate::dom::GradeSelectors;
use crate::error::{Error, Result};

/// A selector compiled for matching against a [`Document`](crate::Document).
pub type CompiledSelector = Selector<GradeSelectors>;

/// CSS specificity for cascade ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Specificity {
    pub ids: u16,
    pub classes: u16,
    pub elements: u16,
}

impl Specificity {
    pub fn from_selector(selector: &CompiledSelector) -> Self {
        let spec = selector.specificity();
        // selectors crate packs specificity as (id << 20) | (class << 10) | elements
        Self {
            ids: ((spec >> 20) & 0x3FF) as u16,
            classes: ((spec >> 10) & 0x3FF) as u16,
            elements: (spec & 0x3FF) as u16,
        }
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ids
            .cmp(&other.ids)
            .then(self.classes.cmp(&other.classes))
            .then(self.elements.cmp(&other.elements))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// What a selector needs beyond static structure.
#[derive(Debug, Default)]
struct StateVisitor {
    dynamic: bool,
    pseudo_element: bool,
}

impl SelectorVisitor for StateVisitor {
    type Impl = GradeSelectors;

    fn visit_simple_selector(&mut self, component: &Component<GradeSelectors>) -> bool {
        match component {
            Component::NonTSPseudoClass(pc) if pc.is_dynamic() => self.dynamic = true,
            Component::PseudoElement(_) => self.pseudo_element = true,
            _ => {}
        }
        true
    }
}

fn classify(selector: &CompiledSelector) -> StateVisitor {
    let mut visitor = StateVisitor::default();
    selector.visit(&mut visitor);
    visitor
}

/// Whether the selector depends on user interaction (`:hover`, `:focus`, ...).
pub fn has_dynamic_state(selector: &CompiledSelector) -> bool {
    classify(selector).dynamic
}

/// Whether the selector targets a pseudo-element rather than an element.
pub fn has_pseudo_element(selector: &CompiledSelector) -> bool {
    classify(selector).pseudo_element
}

/// Canonical text of a selector (`nav  a:HOVER` -> `nav a:hover`).
pub fn serialize(selector: &CompiledSelector) -> String {
    selector.to_css_string()
}

/// Parse a comma-separated selector list inside a cssparser parser.
pub(crate) fn parse_selector_list<'i>(
    input: &mut Parser<'i, '_>,
) -> std::result::Result<Vec<CompiledSelector>, ParseError<'i, SelectorParseErrorKind<'i>>> {
    SelectorList::parse(&GradeSelectors, input, ParseRelative::No)
        .map(|list| list.slice().to_vec())
}

/// Describe a selector parse failure. Returns `(unsupported, reason)`.
pub(crate) fn describe_error(
    err: &ParseError<'_, SelectorParseErrorKind<'_>>,
) -> (bool, String) {
    match &err.kind {
        ParseErrorKind::Custom(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)) => (
            true,
            format!("unsupported pseudo-class or pseudo-element `{name}`"),
        ),
        ParseErrorKind::Custom(kind) => (false, format!("{kind:?}")),
        ParseErrorKind::Basic(kind) => (false, kind.to_string()),
    }
}

/// Compile a standalone selector list.
pub fn parse_selectors(text: &str) -> Result<Vec<CompiledSelector>> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parser
        .parse_entirely(parse_selector_list)
        .map_err(|err| {
            let (unsupported, reason) = describe_error(&err);
            let reason = if unsupported {
                reason
            } else {
                format!("invalid selector syntax ({reason})")
            };
            Error::UnsupportedSelector {
                selector: text.trim().to_string(),
                reason,
            }
        })
}

/// Compile a selector used to query element styles.
///
/// Query selectors must be answerable from the static document: dynamic
/// pseudo-classes and pseudo-elements are rejected rather than silently
/// matching nothing.
pub(crate) fn parse_query_selector(text: &str) -> Result<Vec<CompiledSelector>> {
    let selectors = parse_selectors(text)?;
    for selector in &selectors {
        let state = classify(selector);
        let reason = if state.dynamic {
            "dynamic pseudo-classes have no static computed style; inspect the rule instead"
        } else if state.pseudo_element {
            "pseudo-elements are not part of the document tree"
        } else {
            continue;
        };
        return Err(Error::UnsupportedSelector {
            selector: text.trim().to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(selectors)
}
