//! Index client trait for querying and updating the external search index

use serde_json::Value;

/// Result of a select query
#[derive(Debug, Clone, Default)]
pub struct SelectResponse {
    /// Total matches reported by the index
    pub num_found: usize,

    /// Returned documents (bounded by the row limit of the query)
    pub docs: Vec<Value>,
}

/// Errors that can occur talking to the index
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndexError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("index returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for clients of the external search index.
///
/// The index owns retry and backoff policy, if any; a failed call surfaces
/// as an [`IndexError`] and the caller decides what to abort.
#[async_trait::async_trait]
pub trait IndexClient: Send + Sync {
    /// Instance name, used in diagnostics
    fn name(&self) -> &str;

    /// Run a select query, optionally narrowed by a filter query, returning
    /// at most `rows` documents restricted to `fields` when given.
    async fn select(
        &self,
        query: &str,
        filter_query: Option<&str>,
        rows: usize,
        fields: Option<&str>,
    ) -> Result<SelectResponse, IndexError>;

    /// Add or replace documents in the index
    async fn update(&self, documents: &[Value]) -> Result<(), IndexError>;

    /// Delete every document matching the query
    async fn delete(&self, query: &str) -> Result<(), IndexError>;
}
