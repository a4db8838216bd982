//! HTTP client for a Solr-style index core

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::{IndexClient, IndexError, SelectResponse};

/// Client for one index instance, authenticated with HTTP basic auth when
/// credentials are configured.
pub struct SolrClient {
    name: String,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SolrSelectBody {
    response: SolrResponseBody,
}

#[derive(Deserialize)]
struct SolrResponseBody {
    #[serde(rename = "numFound")]
    num_found: usize,
    docs: Vec<Value>,
}

impl SolrClient {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        let url = url.into();
        Self {
            name: name.into(),
            base_url: url.trim_end_matches('/').to_string(),
            username,
            password,
            http: reqwest::Client::new(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_deref()),
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(IndexError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl IndexClient for SolrClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn select(
        &self,
        query: &str,
        filter_query: Option<&str>,
        rows: usize,
        fields: Option<&str>,
    ) -> Result<SelectResponse, IndexError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("rows", rows.to_string()),
            ("wt", "json".to_string()),
        ];
        if let Some(fq) = filter_query {
            params.push(("fq", fq.to_string()));
        }
        if let Some(fl) = fields {
            params.push(("fl", fl.to_string()));
        }

        debug!(instance = %self.name, %query, ?filter_query, rows, "select");

        let request = self
            .authorize(self.http.get(format!("{}/select", self.base_url)))
            .query(&params);
        let response = request
            .send()
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let body: SolrSelectBody = response
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(e.to_string()))?;

        Ok(SelectResponse {
            num_found: body.response.num_found,
            docs: body.response.docs,
        })
    }

    async fn update(&self, documents: &[Value]) -> Result<(), IndexError> {
        debug!(instance = %self.name, count = documents.len(), "update");

        let request = self
            .authorize(self.http.post(format!("{}/update", self.base_url)))
            .query(&[("commit", "true")])
            .json(documents);
        let response = request
            .send()
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, query: &str) -> Result<(), IndexError> {
        debug!(instance = %self.name, %query, "delete");

        let request = self
            .authorize(self.http.post(format!("{}/update", self.base_url)))
            .query(&[("commit", "true")])
            .json(&json!({ "delete": { "query": query } }));
        let response = request
            .send()
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_trimmed() {
        let client = SolrClient::new("test", "http://localhost:8983/solr/geodata/", None, None);
        assert_eq!(client.base_url, "http://localhost:8983/solr/geodata");
        assert_eq!(client.name(), "test");
    }
}
