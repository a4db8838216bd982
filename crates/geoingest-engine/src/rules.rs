//! Configurable cross-field rules for GeoBlacklight payloads
//!
//! Each rule is a pure function over one payload; the enabled set is built
//! from configuration into a fixed strategy table that the engine iterates.
//! Labels match the config keys and never change.

use geoingest_core::{Config, Diagnostic, Severity, UID_FIELD};
use serde_json::Value;

pub const SLUG_FIELD: &str = "layer_slug_s";
pub const YEAR_FIELD: &str = "solr_year_i";
pub const TEMPORAL_FIELD: &str = "dct_temporal_sm";
pub const TITLE_FIELD: &str = "dc_title_s";
pub const REFERENCES_FIELD: &str = "dct_references_s";

pub const RULE_PROPERTIES_NOT_NULL: &str = "properties-not-null";
pub const RULE_IDENTIFIER_SLUG_MATCH: &str = "identifier-layer-slug-match";
pub const RULE_TEMPORAL_CONTAINS_YEAR: &str = "temporal-contains-solr-year";
pub const RULE_TITLE_CONTAINS_YEAR: &str = "title-contains-solr-year";
pub const RULE_REFERENCES_CONTAINS_YEAR: &str = "references-contains-solr-year";
pub const RULE_EXISTING_UID: &str = "existing-uid";

/// Presence of a payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldState {
    Present,
    Empty,
    Missing,
}

/// Probe one field: absent key is missing; `""` and `null` are empty;
/// everything else (numbers, arrays, objects) counts as present.
pub(crate) fn field_state(payload: &Value, field: &str) -> FieldState {
    match payload.get(field) {
        None => FieldState::Missing,
        Some(Value::Null) => FieldState::Empty,
        Some(Value::String(s)) if s.is_empty() => FieldState::Empty,
        Some(_) => FieldState::Present,
    }
}

fn all_present(payload: &Value, fields: &[&str]) -> bool {
    fields
        .iter()
        .all(|field| field_state(payload, field) == FieldState::Present)
}

/// The fixed set of per-record rule kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Every configured field must be present and non-empty
    PropertiesNotNull,

    /// `dc_identifier_s` and `layer_slug_s` must be string-equal
    IdentifierSlugMatch,

    /// The year must appear in at least one `dct_temporal_sm` entry
    TemporalContainsYear,

    /// The year must appear in `dc_title_s`
    TitleContainsYear,

    /// The year should appear in `dct_references_s` (warning only)
    ReferencesContainsYear,
}

impl RuleKind {
    /// Stable rule name, used as config key and diagnostic label
    pub fn name(&self) -> &'static str {
        match self {
            Self::PropertiesNotNull => RULE_PROPERTIES_NOT_NULL,
            Self::IdentifierSlugMatch => RULE_IDENTIFIER_SLUG_MATCH,
            Self::TemporalContainsYear => RULE_TEMPORAL_CONTAINS_YEAR,
            Self::TitleContainsYear => RULE_TITLE_CONTAINS_YEAR,
            Self::ReferencesContainsYear => RULE_REFERENCES_CONTAINS_YEAR,
        }
    }

    const ALL: [RuleKind; 5] = [
        Self::PropertiesNotNull,
        Self::IdentifierSlugMatch,
        Self::TemporalContainsYear,
        Self::TitleContainsYear,
        Self::ReferencesContainsYear,
    ];
}

/// One enabled rule, with the field list for the required-non-empty rule
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub kind: RuleKind,
    pub fields: Vec<String>,
}

impl RuleSpec {
    /// Build the enabled rule table from configuration; absent or disabled
    /// rules are left out entirely.
    pub fn from_config(config: &Config) -> Vec<RuleSpec> {
        RuleKind::ALL
            .iter()
            .filter_map(|&kind| match config.check(kind.name()) {
                Some(setting) if setting.is_enabled() => Some(RuleSpec {
                    kind,
                    fields: setting.fields().to_vec(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Apply this rule to one payload. A rule whose input fields are empty
    /// or missing is skipped, not failed; only the required-non-empty rule
    /// reports on absence itself.
    pub fn apply(&self, payload: &Value) -> Vec<(Severity, Diagnostic)> {
        match self.kind {
            RuleKind::PropertiesNotNull => properties_not_null(payload, &self.fields),
            RuleKind::IdentifierSlugMatch => identifier_slug_match(payload).into_iter().collect(),
            RuleKind::TemporalContainsYear => temporal_contains_year(payload).into_iter().collect(),
            RuleKind::TitleContainsYear => title_contains_year(payload).into_iter().collect(),
            RuleKind::ReferencesContainsYear => {
                references_contains_year(payload).into_iter().collect()
            }
        }
    }
}

fn properties_not_null(payload: &Value, fields: &[String]) -> Vec<(Severity, Diagnostic)> {
    let mut out = Vec::new();
    for field in fields {
        let message = match field_state(payload, field) {
            FieldState::Present => continue,
            FieldState::Empty => format!("'{}' is empty", field),
            FieldState::Missing => format!("Required field '{}' was not found", field),
        };
        out.push((
            Severity::Error,
            Diagnostic::new(RULE_PROPERTIES_NOT_NULL, message),
        ));
    }
    out
}

fn identifier_slug_match(payload: &Value) -> Option<(Severity, Diagnostic)> {
    if !all_present(payload, &[UID_FIELD, SLUG_FIELD]) {
        return None;
    }
    let identifier = payload.get(UID_FIELD)?.as_str()?;
    let slug = payload.get(SLUG_FIELD)?.as_str()?;
    if identifier == slug {
        return None;
    }
    Some((
        Severity::Error,
        Diagnostic::new(
            RULE_IDENTIFIER_SLUG_MATCH,
            format!("'{}' and '{}' do not match", UID_FIELD, SLUG_FIELD),
        )
        .with_detail(format!("'{}', '{}'", identifier, slug)),
    ))
}

/// String form of the year field, whether it arrives as a JSON number or a
/// string
fn year_string(payload: &Value) -> Option<String> {
    match payload.get(YEAR_FIELD)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn temporal_contains_year(payload: &Value) -> Option<(Severity, Diagnostic)> {
    if !all_present(payload, &[YEAR_FIELD, TEMPORAL_FIELD]) {
        return None;
    }
    let year = year_string(payload)?;
    let temporal = payload.get(TEMPORAL_FIELD)?.as_array()?;

    if temporal
        .iter()
        .filter_map(Value::as_str)
        .any(|entry| entry.contains(&year))
    {
        return None;
    }

    Some((
        Severity::Error,
        Diagnostic::new(
            RULE_TEMPORAL_CONTAINS_YEAR,
            format!("'{}' does not contain '{}'", TEMPORAL_FIELD, YEAR_FIELD),
        )
        .with_detail(format!("{}, '{}'", payload[TEMPORAL_FIELD], year)),
    ))
}

fn title_contains_year(payload: &Value) -> Option<(Severity, Diagnostic)> {
    if !all_present(payload, &[YEAR_FIELD, TITLE_FIELD]) {
        return None;
    }
    let year = year_string(payload)?;
    let title = payload.get(TITLE_FIELD)?.as_str()?;

    if title.contains(&year) {
        return None;
    }

    Some((
        Severity::Error,
        Diagnostic::new(
            RULE_TITLE_CONTAINS_YEAR,
            format!("'{}' does not contain '{}'", TITLE_FIELD, YEAR_FIELD),
        )
        .with_detail(format!("'{}', '{}'", title, year)),
    ))
}

fn references_contains_year(payload: &Value) -> Option<(Severity, Diagnostic)> {
    if !all_present(payload, &[YEAR_FIELD, REFERENCES_FIELD]) {
        return None;
    }
    let year = year_string(payload)?;
    let references = payload.get(REFERENCES_FIELD)?.as_str()?;

    if references.contains(&year) {
        return None;
    }

    // Soft check: references often point at undated landing pages
    Some((
        Severity::Warning,
        Diagnostic::new(
            RULE_REFERENCES_CONTAINS_YEAR,
            format!("'{}' does not contain '{}'", REFERENCES_FIELD, YEAR_FIELD),
        )
        .with_detail(format!("{}, '{}'", references, year)),
    ))
}
