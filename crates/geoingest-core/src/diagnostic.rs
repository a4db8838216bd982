//! Diagnostics attached to records during a validation run.
//!
//! Labels double as rule identifiers in configuration, so they are stable:
//! never rename an existing label, only add new ones.

use serde::{Deserialize, Serialize};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Warning - should be reviewed but does not block ingestion
    Warning,

    /// Error - blocks ingestion of the whole batch
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A labeled error or warning produced by a validator or rule.
///
/// Immutable once created. The label is the rule name for rule violations,
/// or the colon-joined schema path for schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule identifier or schema path
    pub label: String,

    /// Human-readable summary
    pub message: String,

    /// Optional technical context (offending values, match counts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no detail
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// Attach technical context
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.label, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_detail() {
        let diag = Diagnostic::new("properties-not-null", "'dc_title_s' is empty");
        assert_eq!(diag.to_string(), "(properties-not-null) 'dc_title_s' is empty");
    }

    #[test]
    fn display_with_detail() {
        let diag = Diagnostic::new("identifier-layer-slug-match", "fields do not match")
            .with_detail("'a', 'b'");
        assert_eq!(
            diag.to_string(),
            "(identifier-layer-slug-match) fields do not match: 'a', 'b'"
        );
    }

    #[test]
    fn serialization_skips_empty_detail() {
        let diag = Diagnostic::new("schema-validation", "missing property");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("detail"));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
    }
}
