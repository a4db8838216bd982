//! Mock index client for testing
//!
//! Holds documents in memory and answers the small query dialect the rest
//! of the system actually issues: `*:*`, `field:value`, and the
//! parenthesized identifier lists produced by the duplicate check. Every
//! query is recorded so tests can assert on chunking behavior, and a
//! transport failure can be simulated.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::client::{IndexClient, IndexError, SelectResponse};

/// In-memory stand-in for an index instance
pub struct MockIndex {
    name: String,
    docs: Vec<Value>,
    select_queries: Mutex<Vec<String>>,
    updates: Mutex<Vec<Value>>,
    deletes: Mutex<Vec<String>>,
    fail_transport: bool,
}

impl MockIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: Vec::new(),
            select_queries: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            fail_transport: false,
        }
    }

    /// Seed a document carrying only an identifier field
    pub fn with_existing_id(mut self, field: &str, uid: &str) -> Self {
        self.docs.push(json!({ field: uid }));
        self
    }

    /// Seed a full document
    pub fn with_doc(mut self, doc: Value) -> Self {
        self.docs.push(doc);
        self
    }

    /// Make every call fail with a transport error
    pub fn with_transport_failure(mut self) -> Self {
        self.fail_transport = true;
        self
    }

    /// Filter queries seen by `select`, in call order
    pub fn recorded_queries(&self) -> Vec<String> {
        self.select_queries.lock().unwrap().clone()
    }

    /// Documents passed to `update`, in call order
    pub fn updated_docs(&self) -> Vec<Value> {
        self.updates.lock().unwrap().clone()
    }

    /// Queries passed to `delete`, in call order
    pub fn deleted_queries(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    fn fail(&self) -> Result<(), IndexError> {
        if self.fail_transport {
            return Err(IndexError::Transport("simulated connection failure".to_string()));
        }
        Ok(())
    }

    fn matches(&self, expr: &str) -> Vec<Value> {
        if expr == "*:*" {
            return self.docs.clone();
        }

        let Some((field, value)) = expr.split_once(':') else {
            return Vec::new();
        };

        // `field:(a b c)` matches any listed value, `field:v` exactly one
        let values: Vec<&str> = match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
            Some(inner) => inner.split_whitespace().collect(),
            None => vec![value.trim_matches('"')],
        };

        self.docs
            .iter()
            .filter(|doc| {
                doc.get(field)
                    .and_then(Value::as_str)
                    .map(|actual| values.contains(&actual))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl IndexClient for MockIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn select(
        &self,
        query: &str,
        filter_query: Option<&str>,
        rows: usize,
        _fields: Option<&str>,
    ) -> Result<SelectResponse, IndexError> {
        self.fail()?;

        let effective = filter_query.unwrap_or(query);
        self.select_queries.lock().unwrap().push(effective.to_string());

        let matched = self.matches(effective);
        let num_found = matched.len();
        Ok(SelectResponse {
            num_found,
            docs: matched.into_iter().take(rows).collect(),
        })
    }

    async fn update(&self, documents: &[Value]) -> Result<(), IndexError> {
        self.fail()?;
        self.updates.lock().unwrap().extend_from_slice(documents);
        Ok(())
    }

    async fn delete(&self, query: &str) -> Result<(), IndexError> {
        self.fail()?;
        self.deletes.lock().unwrap().push(query.to_string());
        Ok(())
    }
}
