//! # stylegrade
//!
//! Grade HTML/CSS exercises against a rubric of expected computed styles.
//!
//! ## Features
//!
//! - Parse stylesheets into ordered rules with positions and rule kinds
//! - Resolve the cascade for every element: `<style>` and linked sheets,
//!   `@import`, inline styles, specificity, `!important`
//! - Expand and recompose shorthands (`margin`, `border-radius`, `font`, ...)
//! - Evaluate a JSON rubric of style, rule, count and markup assertions
//!
//! ## Quick Start
//!
//! ```
//! use stylegrade::{Rubric, grade};
//!
//! let rubric = Rubric::from_json(r#"[
//!     {"id": "p-color", "type": "style", "selector": "p", "property": "color", "expected": "red"}
//! ]"#).unwrap();
//!
//! let report = grade(
//!     r#"<p style="color: red">Hello</p>"#,
//!     "p { color: blue; margin: 1rem }",
//!     &rubric,
//! ).unwrap();
//! assert!(report.passed());
//! ```
//!
//! ## Querying styles
//!
//! ```
//! use stylegrade::{Document, Stylesheet, resolve};
//!
//! let doc = Document::parse("<section><p>x</p></section>");
//! let sheet = Stylesheet::parse("p { margin: 1rem } section p { margin-top: 5px }").unwrap();
//! let resolved = resolve(&doc, &sheet).unwrap();
//!
//! assert_eq!(resolved.effective_value("p", "margin-top").unwrap().as_deref(), Some("5px"));
//! assert_eq!(resolved.effective_value("p", "margin-left").unwrap().as_deref(), Some("1rem"));
//! ```

pub mod css;
pub mod dom;
pub mod error;
mod grade;
pub mod report;
pub mod resource;
pub mod rubric;
pub mod style;
pub mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use css::{
    Declaration, RuleInspector, RuleKind, RuleMatcher, StyleRule, Stylesheet, StylesheetCache,
};
pub use dom::{Document, NodeId};
pub use error::{Error, Result};
#[cfg(not(target_arch = "wasm32"))]
pub use grade::{file_url, grade_files};
pub use grade::{grade, grade_with};
pub use report::{Report, Summary};
pub use resource::{MemoryLoader, ResourceLoader};
#[cfg(not(target_arch = "wasm32"))]
pub use resource::FileLoader;
pub use rubric::{AssertionResult, Expected, Rubric, evaluate};
pub use style::{ComputedStyle, ResolveOptions, ResolvedStyles, Resolver, resolve};
