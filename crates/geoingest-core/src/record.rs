//! Record model and the keyed record set processed as one ingestion batch.
//!
//! A `RecordSet` owns its records exclusively: every diagnostic is appended
//! through the set so that the aggregate error/warning counters always equal
//! the sum of the per-record counts.

use std::collections::HashMap;

use serde_json::Value;

use crate::diagnostic::{Diagnostic, Severity};

/// Payload field holding the unique record identifier.
pub const UID_FIELD: &str = "dc_identifier_s";

/// Integrity errors raised while populating a record set
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("duplicate identifier '{0}' already present in the record set")]
    DuplicateIdentifier(String),

    #[error("record from {0} has an empty or missing 'dc_identifier_s' field")]
    MissingIdentifier(String),
}

/// One metadata document plus its accumulated diagnostics.
///
/// Created and mutated only by the owning [`RecordSet`]; the payload itself
/// is never modified after insertion.
#[derive(Debug, Clone)]
pub struct RecordModel {
    /// Origin of the payload (usually a file path)
    pub source_location: Option<String>,

    /// The raw metadata document
    pub payload: Value,

    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl RecordModel {
    fn new(payload: Value, source_location: Option<String>) -> Self {
        Self {
            source_location,
            payload,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Number of error diagnostics (0 = none)
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of warning diagnostics (0 = none)
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Error diagnostics in append order
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Warning diagnostics in append order
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Origin shown in reports: the source location when known, otherwise
    /// the identifier field from the payload.
    pub fn origin(&self) -> &str {
        if let Some(location) = &self.source_location {
            return location;
        }
        self.payload
            .get(UID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
    }
}

/// Keyed collection of records validated together as one ingestion batch.
///
/// Records keep their insertion order; lookups by identifier go through a
/// side index. Created empty per run and discarded when the run completes.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<RecordModel>,
    by_id: HashMap<String, usize>,
    error_count: usize,
    warning_count: usize,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record, keyed by its `dc_identifier_s` payload field.
    ///
    /// Fails when the identifier is empty or missing, or when another record
    /// with the same identifier is already present; in the duplicate case
    /// the set retains the first record.
    pub fn add_record(
        &mut self,
        payload: Value,
        source_location: Option<String>,
    ) -> Result<(), RecordError> {
        let uid = payload
            .get(UID_FIELD)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                RecordError::MissingIdentifier(
                    source_location.clone().unwrap_or_else(|| "<input>".to_string()),
                )
            })?
            .to_string();

        if self.by_id.contains_key(&uid) {
            return Err(RecordError::DuplicateIdentifier(uid));
        }

        self.by_id.insert(uid, self.records.len());
        self.records.push(RecordModel::new(payload, source_location));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RecordModel> {
        self.records.iter()
    }

    /// Record at `index` (insertion order)
    pub fn record(&self, index: usize) -> &RecordModel {
        &self.records[index]
    }

    pub fn get(&self, uid: &str) -> Option<&RecordModel> {
        self.by_id.get(uid).map(|&index| &self.records[index])
    }

    /// Identifiers in insertion order
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<(usize, &String)> =
            self.by_id.iter().map(|(uid, &index)| (index, uid)).collect();
        ids.sort_by_key(|(index, _)| *index);
        ids.into_iter().map(|(_, uid)| uid.clone()).collect()
    }

    /// Append a diagnostic to the record at `index`.
    ///
    /// The only mutation path for diagnostics; it keeps the aggregate
    /// counters in lockstep with the per-record lists.
    pub fn annotate(&mut self, index: usize, severity: Severity, diagnostic: Diagnostic) {
        let record = &mut self.records[index];
        match severity {
            Severity::Error => {
                record.errors.push(diagnostic);
                self.error_count += 1;
            }
            Severity::Warning => {
                record.warnings.push(diagnostic);
                self.warning_count += 1;
            }
        }
    }

    /// Append a diagnostic to the record with the given identifier.
    /// Returns false when no such record exists.
    pub fn annotate_by_id(&mut self, uid: &str, severity: Severity, diagnostic: Diagnostic) -> bool {
        match self.by_id.get(uid) {
            Some(&index) => {
                self.annotate(index, severity, diagnostic);
                true
            }
            None => false,
        }
    }

    /// Total error diagnostics across all records
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Total warning diagnostics across all records
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Deterministic, ordered report of every record carrying diagnostics.
    ///
    /// Intended for user-facing output, not control flow: totals first, then
    /// each affected record's diagnostics in insertion order.
    pub fn summarize(&self) -> String {
        let with_errors = self.records.iter().filter(|r| r.has_errors()).count();
        let with_warnings = self.records.iter().filter(|r| r.has_warnings()).count();

        let mut out = format!(
            "{} of {} records have errors; {} have warnings",
            with_errors,
            self.records.len(),
            with_warnings
        );

        for record in &self.records {
            if !record.has_errors() && !record.has_warnings() {
                continue;
            }
            out.push('\n');
            out.push_str(record.origin());
            for diag in record.errors() {
                out.push_str(&format!("\n  error: {}", diag));
            }
            for diag in record.warnings() {
                out.push_str(&format!("\n  warning: {}", diag));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload(uid: &str) -> Value {
        json!({ UID_FIELD: uid, "dc_title_s": "Test Layer" })
    }

    #[test]
    fn add_record_extracts_identifier() {
        let mut set = RecordSet::new();
        set.add_record(payload("wisc-001"), Some("a.json".into())).unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.get("wisc-001").is_some());
        assert_eq!(set.identifiers(), vec!["wisc-001".to_string()]);
    }

    #[test]
    fn duplicate_identifier_rejected_first_retained() {
        let mut set = RecordSet::new();
        set.add_record(payload("wisc-001"), Some("a.json".into())).unwrap();

        let err = set
            .add_record(payload("wisc-001"), Some("b.json".into()))
            .unwrap_err();

        assert!(matches!(err, RecordError::DuplicateIdentifier(ref uid) if uid == "wisc-001"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("wisc-001").unwrap().source_location.as_deref(), Some("a.json"));
    }

    #[test]
    fn missing_identifier_rejected() {
        let mut set = RecordSet::new();

        let err = set
            .add_record(json!({"dc_title_s": "No id"}), Some("c.json".into()))
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingIdentifier(_)));

        let err = set
            .add_record(json!({UID_FIELD: ""}), None)
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingIdentifier(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn aggregate_counts_track_annotations() {
        let mut set = RecordSet::new();
        set.add_record(payload("a"), None).unwrap();
        set.add_record(payload("b"), None).unwrap();

        set.annotate(0, Severity::Error, Diagnostic::new("rule-1", "bad"));
        set.annotate(0, Severity::Warning, Diagnostic::new("rule-2", "iffy"));
        set.annotate_by_id("b", Severity::Error, Diagnostic::new("rule-1", "bad"));

        assert_eq!(set.error_count(), 2);
        assert_eq!(set.warning_count(), 1);
        assert_eq!(
            set.error_count(),
            set.iter().map(RecordModel::error_count).sum::<usize>()
        );
        assert_eq!(
            set.warning_count(),
            set.iter().map(RecordModel::warning_count).sum::<usize>()
        );
        assert!(!set.annotate_by_id("missing", Severity::Error, Diagnostic::new("x", "y")));
    }

    #[test]
    fn summarize_lists_records_in_insertion_order() {
        let mut set = RecordSet::new();
        set.add_record(payload("a"), Some("a.json".into())).unwrap();
        set.add_record(payload("b"), Some("b.json".into())).unwrap();
        set.annotate(1, Severity::Error, Diagnostic::new("rule-1", "broken"));
        set.annotate(0, Severity::Warning, Diagnostic::new("rule-2", "iffy"));

        let summary = set.summarize();
        assert_eq!(
            summary,
            "1 of 2 records have errors; 1 have warnings\n\
             a.json\n  warning: (rule-2) iffy\n\
             b.json\n  error: (rule-1) broken"
        );
    }

    #[test]
    fn identifiers_preserve_insertion_order() {
        let mut set = RecordSet::new();
        for uid in ["z", "a", "m"] {
            set.add_record(payload(uid), None).unwrap();
        }
        assert_eq!(set.identifiers(), vec!["z", "a", "m"]);
    }
}
