//! Rule engine and the validate-and-check pipeline

use std::collections::HashMap;

use geoingest_core::{Config, Diagnostic, RecordSet, RunReport, Severity, UID_FIELD};
use geoingest_index::IndexClient;
use geoingest_schema::{SchemaRegistry, SchemaValidator};
use tracing::{debug, error, info, warn};

use crate::chunk::chunk;
use crate::rules::{field_state, FieldState, RuleSpec, RULE_EXISTING_UID};

/// Label for run-level schema definition failures
const SCHEMA_ERROR_LABEL: &str = "schema-error";

/// Applies the configured business rules to a record set.
///
/// Field rules run per record; the duplicate-identifier check runs once for
/// the whole set, querying the external index in size-bounded batches.
/// Run-level problems that belong to no single record accumulate on the
/// engine and are folded into the run report.
pub struct RuleEngine<'a> {
    config: &'a Config,
    rules: Vec<RuleSpec>,
    run_errors: Vec<Diagnostic>,
}

impl<'a> RuleEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            rules: RuleSpec::from_config(config),
            run_errors: Vec::new(),
        }
    }

    /// Run every enabled rule, then the set-wide duplicate check.
    /// Returns true when at least one error was recorded.
    pub async fn check(&mut self, set: &mut RecordSet, index: &dyn IndexClient) -> bool {
        for record_index in 0..set.len() {
            let outcomes: Vec<(Severity, Diagnostic)> = self
                .rules
                .iter()
                .flat_map(|rule| rule.apply(&set.record(record_index).payload))
                .collect();

            if !outcomes.is_empty() {
                debug!(
                    origin = set.record(record_index).origin(),
                    count = outcomes.len(),
                    "rule violations"
                );
            }
            for (severity, diagnostic) in outcomes {
                set.annotate(record_index, severity, diagnostic);
            }
        }

        if self.config.is_check_enabled(RULE_EXISTING_UID) {
            self.check_existing_uids(set, index).await;
        }

        set.has_errors() || !self.run_errors.is_empty()
    }

    /// Run-level errors collected so far
    pub fn run_errors(&self) -> &[Diagnostic] {
        &self.run_errors
    }

    pub fn into_run_errors(self) -> Vec<Diagnostic> {
        self.run_errors
    }

    /// Query the index for identifiers that already exist and attach a
    /// warning to each colliding record.
    ///
    /// A concurrent writer could still insert a colliding identifier between
    /// this check and a later ingestion; that window is an accepted risk.
    async fn check_existing_uids(&mut self, set: &mut RecordSet, index: &dyn IndexClient) {
        // Refuse to query with an incomplete identifier list
        let unverifiable = set
            .iter()
            .any(|record| field_state(&record.payload, UID_FIELD) != FieldState::Present);
        if unverifiable {
            error!("aborting duplicate check: at least one record has no usable identifier");
            self.run_errors.push(Diagnostic::new(
                RULE_EXISTING_UID,
                "cannot verify duplicates: at least one record has an empty or missing identifier",
            ));
            return;
        }

        let identifiers = set.identifiers();
        let fragments = chunk(&identifiers, self.config.max_query_size);
        debug!(
            identifiers = identifiers.len(),
            fragments = fragments.len(),
            "querying index for existing identifiers"
        );

        let mut matches: HashMap<String, usize> = HashMap::new();

        for fragment in fragments {
            let filter_query = format!("{}:({})", UID_FIELD, fragment);
            let response = index
                .select("*:*", Some(&filter_query), set.len(), Some(UID_FIELD))
                .await;

            match response {
                Ok(response) => {
                    for doc in &response.docs {
                        if let Some(uid) = doc.get(UID_FIELD).and_then(|v| v.as_str()) {
                            *matches.entry(uid.to_string()).or_insert(0) += 1;
                        }
                    }
                }
                Err(err) => {
                    // Abandon the rest of the check; diagnostics collected so
                    // far stay on the records.
                    warn!(%err, "duplicate check aborted by index failure");
                    self.run_errors.push(
                        Diagnostic::new(
                            RULE_EXISTING_UID,
                            "duplicate check aborted: index query failed",
                        )
                        .with_detail(err.to_string()),
                    );
                    return;
                }
            }
        }

        // Insertion order keeps the report deterministic
        for uid in &identifiers {
            if let Some(&count) = matches.get(uid) {
                set.annotate_by_id(
                    uid,
                    Severity::Warning,
                    Diagnostic::new(
                        RULE_EXISTING_UID,
                        format!("'{}' already exists in the '{}' index", uid, index.name()),
                    )
                    .with_detail(format!("{} matching record(s)", count)),
                );
            }
        }
    }
}

/// Validate a record set against a named schema, run the configured rules
/// and the duplicate-identifier check, and fold everything into one report.
///
/// The report is always complete: a schema definition failure or an aborted
/// duplicate check becomes a run-level error alongside whatever per-record
/// diagnostics were already collected.
pub async fn validate_and_check(
    config: &Config,
    set: &mut RecordSet,
    schema_name: &str,
    index: &dyn IndexClient,
) -> RunReport {
    let mut run_errors = Vec::new();

    let validator = SchemaValidator::new(SchemaRegistry::new(config));
    match validator.validate(set, schema_name) {
        Ok(true) => info!(schema = schema_name, "schema validation found errors"),
        Ok(false) => debug!(schema = schema_name, "schema validation passed"),
        Err(err) => {
            // Fail closed: the batch cannot be trusted without its schema
            error!(%err, "schema validation unavailable");
            run_errors.push(
                Diagnostic::new(SCHEMA_ERROR_LABEL, "schema could not be applied")
                    .with_detail(err.to_string()),
            );
        }
    }

    let mut engine = RuleEngine::new(config);
    let had_errors = engine.check(set, index).await;
    run_errors.extend(engine.into_run_errors());

    if had_errors || !run_errors.is_empty() {
        warn!(
            errors = set.error_count() + run_errors.len(),
            warnings = set.warning_count(),
            "run finished with findings"
        );
    }

    RunReport::from_record_set(set, run_errors, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoingest_core::Config;
    use geoingest_index::MockIndex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rules_config(toml: &str) -> Config {
        Config::from_toml(toml).unwrap()
    }

    fn record_set(uids: &[&str]) -> RecordSet {
        let mut set = RecordSet::new();
        for uid in uids {
            set.add_record(
                json!({
                    UID_FIELD: uid,
                    "layer_slug_s": uid,
                    "dc_title_s": format!("Layer {} 2020", uid),
                    "solr_year_i": 2020,
                    "dct_temporal_sm": ["2020"],
                    "dct_references_s": "https://example.org/2020"
                }),
                None,
            )
            .unwrap();
        }
        set
    }

    #[tokio::test]
    async fn existing_identifier_warns_only_the_colliding_record() {
        let config = rules_config("[checks]\nexisting-uid = true\n");
        let mut set = record_set(&["a", "b", "c"]);
        let index = MockIndex::new("geodata-test").with_existing_id(UID_FIELD, "b");

        let mut engine = RuleEngine::new(&config);
        let had_errors = engine.check(&mut set, &index).await;

        assert!(!had_errors);
        assert_eq!(set.get("a").unwrap().warning_count(), 0);
        assert_eq!(set.get("c").unwrap().warning_count(), 0);

        let warnings = set.get("b").unwrap().warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].label, RULE_EXISTING_UID);
        assert!(warnings[0].message.contains("'b'"));
        assert!(warnings[0].message.contains("geodata-test"));
        assert_eq!(warnings[0].detail.as_deref(), Some("1 matching record(s)"));
    }

    #[tokio::test]
    async fn duplicate_check_chunks_large_identifier_sets() {
        let config = rules_config("max_query_size = 24\n[checks]\nexisting-uid = true\n");
        let uids: Vec<String> = (0..10).map(|i| format!("wisc-{:03}", i)).collect();
        let uid_refs: Vec<&str> = uids.iter().map(String::as_str).collect();
        let mut set = record_set(&uid_refs);
        let index = MockIndex::new("test");

        let mut engine = RuleEngine::new(&config);
        engine.check(&mut set, &index).await;

        let queries = index.recorded_queries();
        assert!(queries.len() > 1);
        for query in &queries {
            assert!(query.starts_with("dc_identifier_s:("));
        }
        // Every identifier appears in exactly one fragment, in order
        let rejoined: Vec<String> = queries
            .iter()
            .flat_map(|q| {
                q.trim_start_matches("dc_identifier_s:(")
                    .trim_end_matches(')')
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(rejoined, uids);
    }

    #[tokio::test]
    async fn transport_failure_aborts_check_but_keeps_diagnostics() {
        let config = rules_config(
            r#"
            [checks]
            properties-not-null = ["dct_provenance_s"]
            existing-uid = true
            "#,
        );
        let mut set = record_set(&["a"]);
        let index = MockIndex::new("test").with_transport_failure();

        let mut engine = RuleEngine::new(&config);
        let had_errors = engine.check(&mut set, &index).await;

        assert!(had_errors);
        // The field rule fired before the duplicate check was abandoned
        assert_eq!(set.get("a").unwrap().error_count(), 1);
        assert_eq!(engine.run_errors().len(), 1);
        assert_eq!(engine.run_errors()[0].label, RULE_EXISTING_UID);
    }

    #[tokio::test]
    async fn duplicate_check_disabled_means_no_queries() {
        let config = rules_config("[checks]\ntitle-contains-solr-year = true\n");
        let mut set = record_set(&["a"]);
        let index = MockIndex::new("test");

        let mut engine = RuleEngine::new(&config);
        let had_errors = engine.check(&mut set, &index).await;

        assert!(!had_errors);
        assert!(index.recorded_queries().is_empty());
    }
}
