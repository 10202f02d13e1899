//! WASM bindings for grading in the browser.
//!
//! This module exposes the grader to JavaScript via wasm-bindgen.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::report::Report;
use crate::rubric::Rubric;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome {
    Graded {
        #[serde(flatten)]
        report: Report,
    },
    Error {
        message: String,
    },
}

/// Grade markup and a stylesheet against a JSON rubric.
///
/// Always returns JSON: the report with `"status": "graded"`, or
/// `{"status": "error", "message": ...}` when grading could not complete.
#[wasm_bindgen]
pub fn grade_json(html: &str, css: &str, rubric_json: &str) -> String {
    let outcome = Rubric::from_json(rubric_json)
        .and_then(|rubric| crate::grade(html, css, &rubric))
        .map_or_else(
            |e| Outcome::Error {
                message: e.to_string(),
            },
            |report| Outcome::Graded { report },
        );
    serde_json::to_string(&outcome).unwrap_or_else(|e| {
        format!(r#"{{"status":"error","message":"{}"}}"#, e.to_string().replace('"', "'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_json() {
        let out = grade_json(
            "<p>x</p>",
            "p { color: red }",
            r#"[{"id": "c", "type": "style", "selector": "p", "property": "color", "expected": "red"}]"#,
        );
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["status"], "graded");
        assert_eq!(json["summary"]["passed"], 1);

        let out = grade_json("<p>x</p>", "p { color: }", "[]");
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["status"], "error");
    }
}
