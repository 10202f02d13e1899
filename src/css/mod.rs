//! Stylesheet parsing and rule-level tooling.
//!
//! - [`stylesheet`]: strict parse into ordered [`StyleRule`]s
//! - [`selector`]: selector compilation and specificity
//! - [`shorthand`]: shorthand to longhand expansion
//! - [`inspect`]: raw rule queries, independent of the cascade
//! - [`cache`]: content-hash keyed parse cache

pub mod cache;
pub mod inspect;
pub mod selector;
pub mod shorthand;
pub mod stylesheet;
pub mod values;

pub use cache::StylesheetCache;
pub use inspect::{RuleInspector, RuleKindFilter, RuleMatcher, declarations_containing};
pub use selector::{CompiledSelector, Specificity};
pub use shorthand::{collapse, expand, expand_declaration, longhands_of};
pub use stylesheet::{Declaration, RuleKind, SourcePosition, StyleRule, Stylesheet};
