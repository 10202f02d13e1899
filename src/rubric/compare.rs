//! Value comparison modes.

use std::collections::HashMap;

use regex_lite::{Regex, RegexBuilder};

use super::model::Expected;
use crate::css::values::Numeric;
use crate::error::{Error, Result};

/// Numbers closer than this compare equal even with zero tolerance.
const EPSILON: f64 = 1e-9;

/// Compile a `pattern` expectation.
pub(crate) fn compile_pattern(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Collapse runs of whitespace to one space and trim.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compiled regexes of `pattern` expectations, keyed by source and case flag.
#[derive(Debug, Default)]
pub(crate) struct Patterns {
    compiled: HashMap<(String, bool), Regex>,
}

impl Patterns {
    /// Compile every pattern in `expected`; an invalid one is an error.
    pub(crate) fn add(&mut self, expected: &Expected) -> Result<()> {
        match expected {
            Expected::Pattern {
                pattern,
                case_insensitive,
            } => {
                let key = (pattern.clone(), *case_insensitive);
                if !self.compiled.contains_key(&key) {
                    let regex = compile_pattern(pattern, *case_insensitive)?;
                    self.compiled.insert(key, regex);
                }
                Ok(())
            }
            Expected::Not { expected } => self.add(expected),
            _ => Ok(()),
        }
    }

    /// Whether `actual` satisfies `expected`.
    ///
    /// `actual` is `None` when the property is not set; only `not` can pass then.
    pub(crate) fn matches(&self, expected: &Expected, actual: Option<&str>) -> Result<bool> {
        let Some(actual) = actual else {
            return Ok(match expected {
                Expected::Not { expected } => !self.matches(expected, None)?,
                _ => false,
            });
        };

        Ok(match expected {
            Expected::Exact {
                value,
                case_insensitive,
            } => exact(value, actual, *case_insensitive),
            Expected::Pattern {
                pattern,
                case_insensitive,
            } => {
                let key = (pattern.clone(), *case_insensitive);
                match self.compiled.get(&key) {
                    Some(regex) => regex.is_match(actual.trim()),
                    None => compile_pattern(pattern, *case_insensitive)?.is_match(actual.trim()),
                }
            }
            Expected::Numeric {
                value,
                unit,
                tolerance,
            } => numeric(*value, unit.as_deref(), *tolerance, actual),
            Expected::OneOf {
                values,
                case_insensitive,
            } => values.iter().any(|v| exact(v, actual, *case_insensitive)),
            Expected::Not { expected } => !self.matches(expected, Some(actual))?,
            Expected::Present => true,
        })
    }
}

/// Whether `actual` satisfies `expected`.
///
/// `actual` is `None` when the property is not set; only `not` can pass then.
pub fn matches(expected: &Expected, actual: Option<&str>) -> Result<bool> {
    let mut patterns = Patterns::default();
    patterns.add(expected)?;
    patterns.matches(expected, actual)
}

fn exact(expected: &str, actual: &str, case_insensitive: bool) -> bool {
    let (expected, actual) = (normalize_whitespace(expected), normalize_whitespace(actual));
    if case_insensitive {
        expected.eq_ignore_ascii_case(&actual)
    } else {
        expected == actual
    }
}

fn numeric(expected: f64, unit: Option<&str>, tolerance: f64, actual: &str) -> bool {
    let Some(actual) = Numeric::parse(actual) else {
        return false;
    };
    let close = (actual.value - expected).abs() <= tolerance.abs() + EPSILON;
    let unit_ok = match unit {
        None => true,
        // 0 == 0px == 0rem
        Some(_) if expected == 0.0 && actual.is_zero() => true,
        Some(unit) => match actual.unit.as_deref() {
            Some(actual_unit) => actual_unit.eq_ignore_ascii_case(unit.trim()),
            None => unit.trim().is_empty(),
        },
    };
    close && unit_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_expected(value: f64, unit: Option<&str>) -> Expected {
        Expected::Numeric {
            value,
            unit: unit.map(str::to_string),
            tolerance: 0.0,
        }
    }

    #[test]
    fn test_exact_collapses_whitespace() {
        let expected = Expected::exact("1px solid #333");
        assert!(matches(&expected, Some("  1px   solid\n#333 ")).unwrap());
        assert!(!matches(&expected, Some("1px solid #333333")).unwrap());
        assert!(!matches(&expected, None).unwrap());
    }

    #[test]
    fn test_exact_case() {
        let sensitive = Expected::exact("Red");
        assert!(!matches(&sensitive, Some("red")).unwrap());

        let insensitive = Expected::Exact {
            value: "Red".into(),
            case_insensitive: true,
        };
        assert!(matches(&insensitive, Some("RED")).unwrap());
    }

    #[test]
    fn test_pattern() {
        let expected = Expected::Pattern {
            pattern: r"^0?\.5rem".into(),
            case_insensitive: false,
        };
        assert!(matches(&expected, Some(".5rem")).unwrap());
        assert!(matches(&expected, Some("0.5rem 1rem")).unwrap());
        assert!(!matches(&expected, Some("1.5rem")).unwrap());

        let font = Expected::Pattern {
            pattern: "raleway".into(),
            case_insensitive: true,
        };
        assert!(matches(&font, Some("'Raleway', sans-serif")).unwrap());
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let expected = Expected::Pattern {
            pattern: "(unclosed".into(),
            case_insensitive: false,
        };
        assert!(matches!(
            matches(&expected, Some("x")),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(
            Patterns::default()
                .add(&Expected::Not {
                    expected: Box::new(expected)
                })
                .is_err()
        );
    }

    #[test]
    fn test_patterns_compiled_once() {
        let font = Expected::Pattern {
            pattern: "raleway".into(),
            case_insensitive: true,
        };
        let mut patterns = Patterns::default();
        patterns.add(&font).unwrap();
        patterns
            .add(&Expected::Not {
                expected: Box::new(font.clone()),
            })
            .unwrap();
        assert_eq!(patterns.compiled.len(), 1);

        assert!(patterns.matches(&font, Some("'Raleway', serif")).unwrap());
        assert!(!patterns.matches(&font, Some("Georgia")).unwrap());
    }

    #[test]
    fn test_numeric_zero_is_unitless() {
        let expected = numeric_expected(0.0, Some("px"));
        assert!(matches(&expected, Some("0")).unwrap());
        assert!(matches(&expected, Some("0rem")).unwrap());
        assert!(!matches(&expected, Some("1px")).unwrap());
    }

    #[test]
    fn test_numeric_leading_dot_and_unit_case() {
        let expected = numeric_expected(0.5, Some("rem"));
        assert!(matches(&expected, Some(".5rem")).unwrap());
        assert!(matches(&expected, Some("0.5REM")).unwrap());
        assert!(!matches(&expected, Some("0.5em")).unwrap());
        assert!(!matches(&expected, Some("0.5")).unwrap());
    }

    #[test]
    fn test_numeric_without_unit_ignores_unit() {
        let expected = numeric_expected(12.0, None);
        assert!(matches(&expected, Some("12px")).unwrap());
        assert!(matches(&expected, Some("12")).unwrap());
        assert!(!matches(&expected, Some("12px 4px")).unwrap());
        assert!(!matches(&expected, Some("auto")).unwrap());
    }

    #[test]
    fn test_numeric_tolerance_and_percent() {
        let expected = Expected::Numeric {
            value: 33.3,
            unit: Some("%".into()),
            tolerance: 0.1,
        };
        assert!(matches(&expected, Some("33.33%")).unwrap());
        assert!(!matches(&expected, Some("34%")).unwrap());
    }

    #[test]
    fn test_one_of_not_present() {
        let one_of = Expected::OneOf {
            values: vec!["bold".into(), "700".into()],
            case_insensitive: false,
        };
        assert!(matches(&one_of, Some("700")).unwrap());
        assert!(!matches(&one_of, Some("normal")).unwrap());

        let not = Expected::Not {
            expected: Box::new(Expected::exact("none")),
        };
        assert!(matches(&not, Some("underline")).unwrap());
        assert!(!matches(&not, Some("none")).unwrap());
        assert!(matches(&not, None).unwrap());

        assert!(matches(&Expected::Present, Some("x")).unwrap());
        assert!(!matches(&Expected::Present, None).unwrap());
    }
}
