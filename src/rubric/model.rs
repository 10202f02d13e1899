//! Rubric data model, read from JSON.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::css::RuleMatcher;
use crate::error::Result;

/// A list of assertions graded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub assertions: Vec<Assertion>,
}

impl Rubric {
    /// Parse a rubric: either `{"assertions": [...]}` or a bare array.
    pub fn from_json(text: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Full(Rubric),
            Bare(Vec<Assertion>),
        }

        Ok(match serde_json::from_str(text)? {
            Repr::Full(rubric) => rubric,
            Repr::Bare(assertions) => Rubric {
                name: None,
                assertions,
            },
        })
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }
}

/// One gradable assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub check: Check,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Check {
    /// Effective value of a property on a matched element.
    Style {
        selector: String,
        /// Which matched element to inspect; the first by default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        property: String,
        #[serde(deserialize_with = "expected_or_literal")]
        expected: Expected,
    },
    /// A condition on raw stylesheet rules.
    Rule {
        #[serde(rename = "match", default)]
        matcher: RuleMatcher,
        #[serde(flatten)]
        check: RuleCheck,
    },
    /// Number of elements matching a selector.
    Count {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<AttributeFilter>,
        #[serde(default)]
        op: CountOp,
        count: usize,
    },
    /// Whitespace-insensitive SHA-1 of the submitted markup.
    MarkupDigest { expected: String },
    /// Passes when any of the nested checks passes.
    Any { of: Vec<Check> },
}

/// What to check about the rules picked by a [`RuleMatcher`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "kebab-case")]
pub enum RuleCheck {
    /// At least one rule matches.
    Exists,
    Count {
        #[serde(default)]
        op: CountOp,
        count: usize,
    },
    /// Value of a property in the first matching rule.
    Declaration {
        property: String,
        #[serde(deserialize_with = "expected_or_literal")]
        expected: Expected,
        /// Expand shorthands in the rule before the lookup.
        #[serde(default)]
        expand: bool,
        /// Require the property at this declaration index (0-based).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    /// Values of the first matching rule's declarations whose property name
    /// contains a substring, joined with spaces.
    DeclarationValues {
        property_contains: String,
        #[serde(deserialize_with = "expected_or_literal")]
        expected: Expected,
    },
    /// The first matching rule's selector text contains `text`.
    SelectorIncludes { text: String },
}

/// Restrict counted elements by an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeFilter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

impl AttributeFilter {
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        self.equals.as_deref().is_none_or(|e| value == e)
            && self.contains.as_deref().is_none_or(|c| value.contains(c))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountOp {
    #[default]
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CountOp {
    pub fn test(self, actual: usize, expected: usize) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Ne => actual != expected,
            Self::Gt => actual > expected,
            Self::Ge => actual >= expected,
            Self::Lt => actual < expected,
            Self::Le => actual <= expected,
        }
    }
}

impl fmt::Display for CountOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        })
    }
}

/// Expected value and how to compare against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Expected {
    Exact {
        value: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    Pattern {
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    /// A number with optional unit; without a unit any unit is accepted.
    Numeric {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        #[serde(default)]
        tolerance: f64,
    },
    OneOf {
        values: Vec<String>,
        #[serde(default)]
        case_insensitive: bool,
    },
    Not {
        #[serde(deserialize_with = "expected_or_literal")]
        expected: Box<Expected>,
    },
    /// Any value at all.
    Present,
}

impl Expected {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact {
            value: value.into(),
            case_insensitive: false,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact {
                value,
                case_insensitive,
            } => {
                write!(f, "`{value}`")?;
                if *case_insensitive {
                    f.write_str(" (any case)")?;
                }
                Ok(())
            }
            Self::Pattern { pattern, .. } => write!(f, "a value matching /{pattern}/"),
            Self::Numeric {
                value,
                unit,
                tolerance,
            } => {
                write!(f, "`{value}{}`", unit.as_deref().unwrap_or(""))?;
                if *tolerance > 0.0 {
                    write!(f, " (±{tolerance})")?;
                }
                Ok(())
            }
            Self::OneOf { values, .. } => {
                let quoted: Vec<String> = values.iter().map(|v| format!("`{v}`")).collect();
                write!(f, "one of {}", quoted.join(", "))
            }
            Self::Not { expected } => write!(f, "anything but {expected}"),
            Self::Present => f.write_str("any value"),
        }
    }
}

/// Accept a bare string as shorthand for an exact comparison.
fn expected_or_literal<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<Expected>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Literal(String),
        Full(Expected),
    }

    Ok(T::from(match Repr::deserialize(deserializer)? {
        Repr::Literal(value) => Expected::exact(value),
        Repr::Full(expected) => expected,
    }))
}
