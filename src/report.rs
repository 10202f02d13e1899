//! Grading reports.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::rubric::AssertionResult;

/// Exit status when every assertion passed (including an empty rubric).
pub const EXIT_PASSED: u8 = 0;
/// Exit status when at least one assertion failed.
pub const EXIT_FAILED: u8 = 1;
/// Exit status when grading could not complete.
pub const EXIT_FATAL: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Results of one grading run, in rubric order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
    pub summary: Summary,
    pub results: Vec<AssertionResult>,
}

impl Report {
    pub fn new(rubric: Option<String>, results: Vec<AssertionResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            rubric,
            summary: Summary {
                total: results.len(),
                passed,
                failed: results.len() - passed,
            },
            results,
        }
    }

    pub fn passed(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed() { EXIT_PASSED } else { EXIT_FAILED }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering; with `failures_only`, passing lines are left out.
    pub fn render_text(&self, failures_only: bool) -> String {
        let width = self.results.iter().map(|r| r.id.len()).max().unwrap_or(0);
        let mut out = String::new();
        if let Some(name) = &self.rubric {
            out.push_str(&format!("{name}\n\n"));
        }
        for result in &self.results {
            if failures_only && result.passed {
                continue;
            }
            let status = if result.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "{status}  {:width$}  {}\n",
                result.id, result.message
            ));
            if !result.passed
                && let Some(description) = &result.description
            {
                out.push_str(&format!("      {:width$}  ({description})\n", ""));
            }
        }
        if !self.results.is_empty() && !(failures_only && self.passed()) {
            out.push('\n');
        }
        out.push_str(&self.summary.to_string());
        out.push('\n');
        out
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} total",
            self.passed, self.failed, self.total
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, passed: bool) -> AssertionResult {
        AssertionResult {
            id: id.to_string(),
            description: (!passed).then(|| "paragraphs are red".to_string()),
            passed,
            actual: Some("red".to_string()),
            message: format!("{id} message"),
        }
    }

    #[test]
    fn test_summary_and_exit_code() {
        let report = Report::new(None, vec![result("a", true), result("b", false)]);
        assert_eq!(
            report.summary,
            Summary {
                total: 2,
                passed: 1,
                failed: 1
            }
        );
        assert_eq!(report.exit_code(), EXIT_FAILED);
        assert_eq!(report.failures().count(), 1);

        let empty = Report::new(None, Vec::new());
        assert!(empty.passed());
        assert_eq!(empty.exit_code(), EXIT_PASSED);
        assert_eq!(empty.render_text(false), "0 passed, 0 failed, 0 total\n");
    }

    #[test]
    fn test_text_report() {
        let report = Report::new(
            Some("problem-b".into()),
            vec![result("color", true), result("hover-rule", false)],
        );
        let text = report.to_string();
        assert!(text.starts_with("problem-b\n\n"));
        assert!(text.contains("PASS  color       color message\n"));
        assert!(text.contains("FAIL  hover-rule  hover-rule message\n"));
        assert!(text.contains("(paragraphs are red)"));
        assert!(text.ends_with("1 passed, 1 failed, 2 total\n"));

        let failures = report.render_text(true);
        assert!(!failures.contains("PASS"));
    }

    #[test]
    fn test_json_report() {
        let report = Report::new(None, vec![result("a", true)]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["passed"], 1);
        assert_eq!(json["results"][0]["id"], "a");
        assert_eq!(json["results"][0]["actual"], "red");
        assert!(json.get("rubric").is_none());
    }
}
