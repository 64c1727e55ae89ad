//! HTTP token-classification backend
//!
//! Talks to an inference endpoint serving a token-classification pipeline
//! (Hugging Face inference API or a compatible text-generation-inference /
//! TorchServe deployment). The request body is `{"inputs": <text>}` and the
//! response is a list of `{entity_group, score, word, start, end}` objects.

use super::{BackendKind, NerBackend, RawEntity};
use crate::config::{BackendRole, NerBackendConfig, SecretString};
use crate::domain::NerError;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// One element of a token-classification response
#[derive(Debug, Deserialize)]
struct TokenClassification {
    /// `entity_group` with aggregation, `entity` (BIO tagged) without
    #[serde(alias = "entity")]
    entity_group: String,
    score: f64,
    word: String,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

/// Transformer backend reached over HTTP
pub struct HttpNerBackend {
    name: String,
    role: BackendRole,
    endpoint: String,
    api_token: Option<SecretString>,
    client: Client,
}

impl HttpNerBackend {
    /// Creates a backend from its configuration
    pub fn new(config: &NerBackendConfig) -> Result<Self, NerError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| NerError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: config.name.clone(),
            role: config.role,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            client,
        })
    }

    pub fn role(&self) -> BackendRole {
        self.role
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse_response(body: Value) -> Result<Vec<RawEntity>, NerError> {
        // Batched deployments wrap the result of a single input in an outer list
        let body = match body {
            Value::Array(mut items) if items.len() == 1 && items[0].is_array() => items.remove(0),
            other => other,
        };

        if let Some(error) = body.get("error") {
            return Err(NerError::InvalidResponse(error.to_string()));
        }

        let items: Vec<TokenClassification> = serde_json::from_value(body)
            .map_err(|e| NerError::InvalidResponse(e.to_string()))?;

        Ok(items
            .into_iter()
            .map(|item| RawEntity {
                word: item.word.replace(" ##", "").replace("##", ""),
                label: strip_bio_prefix(&item.entity_group).to_string(),
                score: item.score,
                start: item.start,
                end: item.end,
            })
            .collect())
    }
}

/// `B-PER` / `I-PER` → `PER`
fn strip_bio_prefix(label: &str) -> &str {
    label
        .strip_prefix("B-")
        .or_else(|| label.strip_prefix("I-"))
        .unwrap_or(label)
}

#[async_trait]
impl NerBackend for HttpNerBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Transformer
    }

    async fn recognize(&self, text: &str) -> Result<Vec<RawEntity>, NerError> {
        let mut request = self.client.post(&self.endpoint).json(&json!({
            "inputs": text,
            "parameters": { "aggregation_strategy": "simple" }
        }));

        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NerError::Status { status, body });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| NerError::InvalidResponse(e.to_string()))?;

        Self::parse_response(body)
    }
}
