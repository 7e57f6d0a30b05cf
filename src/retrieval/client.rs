//! HTTP client for the vector-store service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::config::VectorServiceConfig;
use crate::errors::GuardRagError;
use crate::errors::Result;
use crate::models::Document;
use crate::retrieval::RetrievalApi;

/// One record of an upload batch, in the service's wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "file")]
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Thin adapter over the external search and dialogue endpoints.
///
/// Every request carries the client-level timeout, so search stays bounded
/// even while the service is busy absorbing a bulk ingestion.
pub struct VectorServiceClient {
    base_url: String,
    token: String,
    metric_type: String,
    database: String,
    client: Client,
}

impl VectorServiceClient {
    pub fn new(config: &VectorServiceConfig) -> Result<Self> {
        // Fail fast on an unusable endpoint instead of at first request
        url::Url::parse(&config.base_url)
            .map_err(|e| GuardRagError::Config(format!("invalid vector base URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            metric_type: config.metric_type.clone(),
            database: config.database.clone(),
            client,
        })
    }

    /// Create the backing database on the service.
    pub async fn create_database(&self) -> Result<()> {
        let url = format!("{}/databases", self.base_url);
        let payload = json!({
            "database_name": self.database,
            "token": self.token,
            "metric_type": self.metric_type,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Upload one batch of records into the backing database.
    pub async fn upload_documents(&self, records: &[UploadRecord]) -> Result<()> {
        let url = format!("{}/databases/{}/files", self.base_url, self.database);
        let payload = json!({
            "files": records,
            "token": self.token,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RetrievalApi for VectorServiceClient {
    async fn search(&self, query: &str, top_k: usize, expr: Option<&str>) -> Result<Vec<Document>> {
        let url = format!("{}/databases/{}/search", self.base_url, self.database);

        let mut payload = json!({
            "token": self.token,
            "query": query,
            "top_k": top_k,
            "metric_type": self.metric_type,
        });
        if let Some(expr) = expr {
            payload["expr"] = Value::String(expr.to_string());
        }

        let response = self.client.post(&url).json(&payload).send().await?;
        let body: Value = ensure_success(response).await?.json().await?;

        Ok(parse_search_results(&body))
    }

    async fn dialogue(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let url = format!("{}/dialogue", self.base_url);
        let payload = json!({
            "user_input": prompt,
            "token": self.token,
            "max_tokens": max_tokens,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        let body: Value = ensure_success(response).await?.json().await?;

        // Missing field degrades to an empty reply
        Ok(body
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GuardRagError::UpstreamStatus {
        status: status.as_u16(),
        body,
    })
}

/// Pull the document list out of a search response, accepting either the
/// `files` or the `results` key. Anything malformed is an empty result set.
fn parse_search_results(body: &Value) -> Vec<Document> {
    let items = body
        .get("files")
        .and_then(Value::as_array)
        .or_else(|| body.get("results").and_then(Value::as_array));

    let Some(items) = items else {
        warn!("search response carried no document list; treating as empty");
        return Vec::new();
    };

    let documents: Vec<Document> = items.iter().filter_map(normalize_document).collect();
    debug!("search returned {} documents", documents.len());
    documents
}

/// Normalize one raw search item into a [`Document`]. Content comes from the
/// first non-empty of the service's content-like keys; the identifier from
/// its id-like keys. Bare strings become content-only documents.
fn normalize_document(item: &Value) -> Option<Document> {
    if let Some(text) = item.as_str() {
        if text.is_empty() {
            return None;
        }
        return Some(Document::from_content(text));
    }

    let object = item.as_object()?;

    let content = ["file_content", "file", "content"]
        .iter()
        .find_map(|key| {
            object
                .get(*key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        })?
        .to_string();

    let id = ["file_id", "id", "name"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(ToString::to_string);

    let metadata = object
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Some(Document {
        id,
        content,
        metadata,
    })
}
