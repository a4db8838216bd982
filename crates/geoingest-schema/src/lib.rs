//! Geoingest Schema
//!
//! JSON Schema validation for metadata records: a file-backed registry that
//! resolves configured schema names to documents, and a validator that
//! annotates every record in a set with its leaf validation failures.

pub mod registry;
pub mod validator;

pub use registry::{SchemaError, SchemaRegistry};
pub use validator::SchemaValidator;
