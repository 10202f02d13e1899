//! Per-element cascaded style.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::css::shorthand::{collapse, expand_declaration, longhands_of};
use crate::css::SourcePosition;

/// Where a cascaded value was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ValueOrigin {
    /// A stylesheet rule; `sheet` indexes [`ResolvedStyles::sources`](super::ResolvedStyles::sources).
    Rule {
        sheet: usize,
        selector: String,
        position: SourcePosition,
    },
    /// The element's `style` attribute.
    Inline,
}

impl std::fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rule {
                selector, position, ..
            } => write!(
                f,
                "rule `{selector}` at {}:{}",
                position.line, position.column
            ),
            Self::Inline => f.write_str("style attribute"),
        }
    }
}

/// The value that won the cascade for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadedValue {
    pub value: String,
    pub important: bool,
    pub origin: ValueOrigin,
    /// Application order within the element; later beats earlier.
    #[serde(skip)]
    pub(crate) seq: usize,
}

/// Cascaded values of one element.
///
/// Shorthand declarations are stored expanded into their longhands, plus the
/// declared shorthand text so an intact shorthand reads back as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComputedStyle {
    longhands: BTreeMap<String, CascadedValue>,
    #[serde(skip)]
    shorthands: BTreeMap<String, CascadedValue>,
}

fn normalize(property: &str) -> Cow<'_, str> {
    if property.starts_with("--") || !property.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Borrowed(property.trim())
    } else {
        Cow::Owned(property.trim().to_ascii_lowercase())
    }
}

impl ComputedStyle {
    /// Apply one declaration on top of everything applied before it.
    pub(crate) fn apply(
        &mut self,
        property: &str,
        value: &str,
        important: bool,
        origin: &ValueOrigin,
        seq: usize,
    ) {
        let cascaded = |value: String| CascadedValue {
            value,
            important,
            origin: origin.clone(),
            seq,
        };

        match expand_declaration(property, value) {
            Some(longhands) => {
                for (name, v) in longhands {
                    self.longhands.insert(name.to_string(), cascaded(v));
                }
                self.shorthands
                    .insert(property.to_string(), cascaded(value.to_string()));
            }
            None if longhands_of(property).is_some() => {
                // Shorthand whose value could not be split; keep it whole.
                self.shorthands
                    .insert(property.to_string(), cascaded(value.to_string()));
            }
            None => {
                self.longhands
                    .insert(property.to_string(), cascaded(value.to_string()));
            }
        }
    }

    /// The winning declaration for a longhand, or for a shorthand whose
    /// components all still come from that declaration.
    pub fn cascaded(&self, property: &str) -> Option<&CascadedValue> {
        let property = normalize(property);
        match longhands_of(&property) {
            Some(_) => self.intact_shorthand(&property),
            None => self.longhands.get(property.as_ref()),
        }
    }

    fn intact_shorthand(&self, shorthand: &str) -> Option<&CascadedValue> {
        let entry = self.shorthands.get(shorthand)?;
        let longhands = longhands_of(shorthand)?;
        let overridden = longhands
            .iter()
            .filter_map(|l| self.longhands.get(*l))
            .any(|v| v.seq > entry.seq);
        (!overridden).then_some(entry)
    }

    /// Effective value of a property.
    ///
    /// Shorthands read back as declared while intact; once a later
    /// declaration changed one of their longhands, the value is composed
    /// from the longhands where an unambiguous composition exists.
    pub fn get(&self, property: &str) -> Option<Cow<'_, str>> {
        let property = normalize(property);
        if longhands_of(&property).is_none() {
            return self
                .longhands
                .get(property.as_ref())
                .map(|v| Cow::Borrowed(v.value.as_str()));
        }
        if let Some(entry) = self.intact_shorthand(&property) {
            return Some(Cow::Borrowed(entry.value.as_str()));
        }
        collapse(&property, |l| self.longhands.get(l).map(|v| v.value.as_str())).map(Cow::Owned)
    }

    /// Longhand values in property order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &CascadedValue)> {
        self.longhands.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.longhands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.longhands.is_empty() && self.shorthands.is_empty()
    }
}
