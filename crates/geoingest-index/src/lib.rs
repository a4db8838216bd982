//! Geoingest Index
//!
//! The external search index collaborator: a black-box key/value
//! search-and-update service reached over HTTP. The core only ever talks to
//! the [`IndexClient`] trait; `SolrClient` is the production implementation
//! and `MockIndex` backs the tests.

pub mod client;
pub mod mock;
pub mod solr;

pub use client::{IndexClient, IndexError, SelectResponse};
pub use mock::MockIndex;
pub use solr::SolrClient;
