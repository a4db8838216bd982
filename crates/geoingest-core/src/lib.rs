//! Geoingest Core
//!
//! Domain model for validating GeoBlacklight metadata records before they
//! are pushed to a search index: diagnostics, records, record sets, run
//! reports, and configuration.

pub mod config;
pub mod diagnostic;
pub mod record;
pub mod report;

pub use config::{Config, ConfigError, InstanceConfig, RuleSetting};
pub use diagnostic::{Diagnostic, Severity};
pub use record::{RecordError, RecordModel, RecordSet, UID_FIELD};
pub use report::{RunReport, RunSummary};
