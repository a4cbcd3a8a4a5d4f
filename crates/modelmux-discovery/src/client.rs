// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the local model discovery endpoint.
//!
//! Speaks the Ollama tags API (`GET /api/tags`). Requests carry a
//! short timeout so a wedged local server degrades to "zero models
//! found" at the sync layer instead of hanging a caller.

use std::time::Duration;

use async_trait::async_trait;
use modelmux_core::ModelmuxError;
use serde::Deserialize;
use tracing::debug;

/// Upper bound on any discovery request.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// One model as reported by the discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveredModel {
    pub name: String,
    #[serde(default)]
    pub details: Option<ModelDetails>,
}

/// Optional metadata the endpoint attaches to a model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub parameter_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<DiscoveredModel>,
}

/// Seam between catalog sync and whatever serves the model list.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Models the source currently serves.
    async fn list_models(&self) -> Result<Vec<DiscoveredModel>, ModelmuxError>;

    /// Provider name catalog rows from this source are stored under.
    fn provider_name(&self) -> &str;
}

/// Discovery client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ModelmuxError> {
        Self::with_timeout(base_url, DISCOVERY_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelmuxError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelmuxError::Discovery {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl CatalogSource for OllamaClient {
    async fn list_models(&self) -> Result<Vec<DiscoveredModel>, ModelmuxError> {
        let url = format!("{}/api/tags", self.base_url);
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| ModelmuxError::Discovery {
                    message: format!("discovery request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelmuxError::Discovery {
                message: format!("discovery endpoint returned {status}"),
                source: None,
            });
        }

        let tags: TagsResponse =
            response.json().await.map_err(|e| ModelmuxError::Discovery {
                message: format!("failed to parse discovery response: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(count = tags.models.len(), "discovery endpoint listed models");
        Ok(tags.models)
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_models_from_tags_endpoint() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "models": [
                {
                    "name": "llama3:8b",
                    "modified_at": "2026-07-01T10:00:00Z",
                    "size": 4661224676u64,
                    "details": {"family": "llama", "parameter_size": "8B"}
                },
                {"name": "qwq:32b"}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "llama3:8b");
        assert_eq!(
            models[0].details.as_ref().unwrap().family.as_deref(),
            Some("llama")
        );
        assert!(models[1].details.is_none());
    }

    #[tokio::test]
    async fn empty_listing_is_fine() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        assert!(client.list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_surfaces_as_discovery_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri()).unwrap();
        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, ModelmuxError::Discovery { .. }));
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"models": [{"name": "phi3:mini"}]})),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(format!("{}/", server.uri())).unwrap();
        assert_eq!(client.list_models().await.unwrap().len(), 1);
    }
}
