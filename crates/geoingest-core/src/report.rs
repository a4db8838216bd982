//! Run report produced by a validation run.
//!
//! The report is always complete: per-record diagnostics stay on the record
//! set, run-level diagnostics (schema definition failures, aborted duplicate
//! checks) are carried here, and the summary folds both together so a caller
//! can gate ingestion on a single error count.

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::record::RecordSet;

/// Summary statistics for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of records checked
    pub records: usize,

    /// Errors, per-record and run-level combined
    pub errors: usize,

    /// Warnings, per-record and run-level combined
    pub warnings: usize,
}

/// Outcome of one validate-and-check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp (ISO 8601)
    pub timestamp: String,

    pub summary: RunSummary,

    /// Errors not attributed to any single record
    pub run_errors: Vec<Diagnostic>,

    /// Warnings not attributed to any single record
    pub run_warnings: Vec<Diagnostic>,

    /// Ordered per-record summary, as produced by `RecordSet::summarize`
    pub record_summary: String,
}

impl RunReport {
    /// Fold a record set and run-level diagnostics into a report
    pub fn from_record_set(
        set: &RecordSet,
        run_errors: Vec<Diagnostic>,
        run_warnings: Vec<Diagnostic>,
    ) -> Self {
        let summary = RunSummary {
            records: set.len(),
            errors: set.error_count() + run_errors.len(),
            warnings: set.warning_count() + run_warnings.len(),
        };

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary,
            run_errors,
            run_warnings,
            record_summary: set.summarize(),
        }
    }

    /// A record with at least one error must never be passed to ingestion
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
