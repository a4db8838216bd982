//! Record validation against a named JSON Schema

use geoingest_core::{Diagnostic, RecordSet, Severity};
use tracing::{debug, info};

use crate::registry::{SchemaError, SchemaRegistry};

/// Fallback label when a validation failure has no schema path
const SCHEMA_LABEL: &str = "schema-validation";

/// Validates every record in a set against one named schema.
pub struct SchemaValidator<'a> {
    registry: SchemaRegistry<'a>,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: SchemaRegistry<'a>) -> Self {
        Self { registry }
    }

    /// Validate every record's payload against the schema registered under
    /// `schema_name`. The schema is compiled once per call; each leaf
    /// validation failure becomes one diagnostic on the failing record,
    /// labeled with the colon-joined schema path.
    ///
    /// Fails closed: an unresolvable or malformed schema is an error for
    /// the whole run, not a silently passing batch.
    ///
    /// Returns true when at least one record failed validation.
    pub fn validate(&self, set: &mut RecordSet, schema_name: &str) -> Result<bool, SchemaError> {
        let schema = self.registry.resolve(schema_name)?;

        let validator =
            jsonschema::validator_for(&schema).map_err(|e| SchemaError::Definition {
                name: schema_name.to_string(),
                reason: e.to_string(),
            })?;

        let mut had_errors = false;

        for index in 0..set.len() {
            let diagnostics: Vec<Diagnostic> = validator
                .iter_errors(&set.record(index).payload)
                .map(|error| {
                    Diagnostic::new(schema_path_label(&error.schema_path.to_string()), error.to_string())
                })
                .collect();

            if diagnostics.is_empty() {
                debug!(origin = set.record(index).origin(), "record passed schema validation");
                continue;
            }

            info!(
                origin = set.record(index).origin(),
                failures = diagnostics.len(),
                schema = schema_name,
                "record failed schema validation"
            );
            for diagnostic in diagnostics {
                set.annotate(index, Severity::Error, diagnostic);
            }
            had_errors = true;
        }

        Ok(had_errors)
    }
}

/// Convert a JSON pointer like `/properties/dc_title_s/type` into the
/// colon-joined label `properties:dc_title_s:type`.
fn schema_path_label(pointer: &str) -> String {
    let joined = pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(":");

    if joined.is_empty() {
        SCHEMA_LABEL.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoingest_core::Config;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SCHEMA: &str = r#"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["dc_identifier_s", "dc_title_s"],
        "properties": {
            "dc_identifier_s": { "type": "string" },
            "dc_title_s": { "type": "string", "minLength": 1 },
            "solr_year_i": { "type": "integer" }
        }
    }"#;

    fn config_with_schema(dir: &std::path::Path, contents: &str) -> Config {
        std::fs::write(dir.join("schema.json"), contents).unwrap();
        let mut config = Config::from_toml("[schemas]\ngeoblacklight-1 = \"schema.json\"\n").unwrap();
        config.project_root = dir.to_path_buf();
        config
    }

    #[test]
    fn valid_records_produce_no_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_schema(dir.path(), SCHEMA);

        let mut set = RecordSet::new();
        set.add_record(
            json!({"dc_identifier_s": "a", "dc_title_s": "Roads", "solr_year_i": 2020}),
            None,
        )
        .unwrap();

        let validator = SchemaValidator::new(SchemaRegistry::new(&config));
        let had_errors = validator.validate(&mut set, "geoblacklight-1").unwrap();

        assert!(!had_errors);
        assert_eq!(set.error_count(), 0);
    }

    #[test]
    fn every_leaf_failure_becomes_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_schema(dir.path(), SCHEMA);

        let mut set = RecordSet::new();
        // missing dc_title_s and a non-integer year: two independent failures
        set.add_record(json!({"dc_identifier_s": "a", "solr_year_i": "2020"}), None)
            .unwrap();

        let validator = SchemaValidator::new(SchemaRegistry::new(&config));
        let had_errors = validator.validate(&mut set, "geoblacklight-1").unwrap();

        assert!(had_errors);
        let record = set.get("a").unwrap();
        assert_eq!(record.error_count(), 2);

        let labels: Vec<&str> = record.errors().iter().map(|d| d.label.as_str()).collect();
        assert!(labels.contains(&"required"));
        assert!(labels.contains(&"properties:solr_year_i:type"));
    }

    #[test]
    fn malformed_schema_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_schema(dir.path(), r#"{"type": "not-a-real-type"}"#);

        let mut set = RecordSet::new();
        set.add_record(json!({"dc_identifier_s": "a"}), None).unwrap();

        let validator = SchemaValidator::new(SchemaRegistry::new(&config));
        let err = validator.validate(&mut set, "geoblacklight-1").unwrap_err();
        assert!(matches!(err, SchemaError::Definition { .. }));
    }

    #[test]
    fn schema_path_labels() {
        assert_eq!(schema_path_label("/properties/dc_title_s/type"), "properties:dc_title_s:type");
        assert_eq!(schema_path_label("/required"), "required");
        assert_eq!(schema_path_label(""), SCHEMA_LABEL);
    }
}
