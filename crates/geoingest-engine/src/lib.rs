//! Geoingest Engine
//!
//! The validation pipeline: schema validation, the configurable rule table,
//! the set-wide duplicate-identifier check, and the query chunker that keeps
//! identifier lookups under the index's transport size limit.

pub mod chunk;
pub mod engine;
pub mod rules;

pub use chunk::chunk;
pub use engine::{validate_and_check, RuleEngine};
pub use rules::{RuleKind, RuleSpec};
