//! Raw rule inspection.
//!
//! Answers "does a rule exist that looks like X" against the parsed rule list
//! without any cascade. This is the only way to check rules whose selectors
//! depend on dynamic state (`:hover`, `:focus`), which never reach computed
//! style.

use serde::{Deserialize, Serialize};

use super::selector::{parse_selectors, serialize};
use super::stylesheet::{Declaration, RuleKind, StyleRule};

/// Rule kind filter for [`RuleMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKindFilter {
    Plain,
    PseudoState,
    AtRule,
}

/// Conditions a rule must meet. Unset fields match every rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleMatcher {
    /// The whole selector list, e.g. `"nav a:hover, nav a:focus"`. Compared
    /// after canonical serialization, so spacing and case of keywords do not
    /// matter.
    pub selector: Option<String>,
    /// Substring of the selector list text, e.g. `":hover"`.
    pub selector_contains: Option<String>,
    /// Minimum number of comma-separated selectors.
    pub min_selectors: Option<usize>,
    pub kind: Option<RuleKindFilter>,
    /// At-rule name without `@`, e.g. `"media"`.
    pub at_rule: Option<String>,
}

impl RuleMatcher {
    pub fn selector(text: impl Into<String>) -> Self {
        Self {
            selector: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn selector_contains(text: impl Into<String>) -> Self {
        Self {
            selector_contains: Some(text.into()),
            ..Self::default()
        }
    }

    /// Canonical form of `selector`, parsed once per search.
    fn canonical_selector(&self) -> Option<Vec<String>> {
        let text = self.selector.as_deref()?;
        match parse_selectors(text) {
            Ok(list) => Some(list.iter().map(serialize).collect()),
            // keep unparseable text so it simply never matches a parsed rule
            Err(_) => Some(vec![text.split_whitespace().collect::<Vec<_>>().join(" ")]),
        }
    }

    fn matches_with(&self, rule: &StyleRule, canonical: Option<&[String]>) -> bool {
        if let Some(expected) = canonical
            && rule.selectors != expected
        {
            return false;
        }
        if let Some(needle) = &self.selector_contains
            && !rule.selector_text().contains(needle.as_str())
        {
            return false;
        }
        if let Some(min) = self.min_selectors
            && rule.selectors.len() < min
        {
            return false;
        }
        if let Some(kind) = self.kind {
            let ok = matches!(
                (kind, &rule.kind),
                (RuleKindFilter::Plain, RuleKind::Plain)
                    | (RuleKindFilter::PseudoState, RuleKind::PseudoState)
                    | (RuleKindFilter::AtRule, RuleKind::AtRule { .. })
            );
            if !ok {
                return false;
            }
        }
        if let Some(name) = &self.at_rule
            && !rule
                .at_rule_name()
                .is_some_and(|n| n.eq_ignore_ascii_case(name.trim_start_matches('@')))
        {
            return false;
        }
        true
    }

    pub fn matches(&self, rule: &StyleRule) -> bool {
        self.matches_with(rule, self.canonical_selector().as_deref())
    }
}

/// Queries over an ordered rule list.
#[derive(Debug, Clone, Copy)]
pub struct RuleInspector<'a> {
    rules: &'a [StyleRule],
}

impl<'a> RuleInspector<'a> {
    pub fn new(rules: &'a [StyleRule]) -> Self {
        Self { rules }
    }

    /// Matching rules in source order.
    pub fn find(&self, matcher: &RuleMatcher) -> Vec<&'a StyleRule> {
        let canonical = matcher.canonical_selector();
        self.rules
            .iter()
            .filter(|rule| matcher.matches_with(rule, canonical.as_deref()))
            .collect()
    }

    pub fn first(&self, matcher: &RuleMatcher) -> Option<&'a StyleRule> {
        self.find(matcher).into_iter().next()
    }

    pub fn count(&self, matcher: &RuleMatcher) -> usize {
        self.find(matcher).len()
    }

    pub fn rules(&self) -> &'a [StyleRule] {
        self.rules
    }
}

/// Declarations of `rule` whose property name contains `needle`, in order.
pub fn declarations_containing<'r>(rule: &'r StyleRule, needle: &str) -> Vec<&'r Declaration> {
    let needle = needle.to_ascii_lowercase();
    rule.declarations
        .iter()
        .filter(|d| d.property.contains(&needle))
        .collect()
}
