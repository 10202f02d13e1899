//! Rubric assertions and their evaluation.
//!
//! A [`Rubric`] is an ordered list of [`Assertion`]s read from JSON:
//!
//! ```json
//! [
//!   {"id": "p-color", "type": "style", "selector": "p", "property": "color", "expected": "red"},
//!   {"id": "hover", "type": "rule", "match": {"selector_contains": ":hover"}, "check": "exists"}
//! ]
//! ```
//!
//! [`evaluate`] turns it into one [`AssertionResult`] per assertion, in
//! rubric order.

mod compare;
mod evaluate;
mod model;

pub use compare::{matches, normalize_whitespace};
pub use evaluate::{AssertionResult, evaluate};
pub use model::{
    Assertion, AttributeFilter, Check, CountOp, Expected, Rubric, RuleCheck,
};
