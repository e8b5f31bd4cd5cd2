//! HTTP generation backend.
//!
//! Speaks a minimal JSON contract shared by self-hosted diffusion
//! gateways: `GET /health` for the availability probe, `POST /generate`
//! returning `{"artifact_location": "..."}`. Retries and fallback live in
//! the chain, not here; one call is one attempt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GenerationRequest;
use crate::domain::ports::Provider;

/// Configuration for one HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Short stable name for provenance and logs.
    pub name: String,
    /// Model reference recorded in candidate provenance.
    pub model_ref: String,
    /// Base URL, e.g. `http://gpu-worker:7860`.
    pub base_url: String,
    /// Bearer token, if the backend requires one.
    pub api_token: Option<String>,
    /// Per-request timeout. The chain bounds attempts independently.
    pub request_timeout_secs: u64,
}

impl HttpProviderConfig {
    pub fn new(
        name: impl Into<String>,
        model_ref: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model_ref: model_ref.into(),
            base_url: base_url.into(),
            api_token: None,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    artifact_location: String,
}

/// A remote generation backend behind the [`Provider`] port.
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: ReqwestClient,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> DomainResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|err| DomainError::ProviderUnavailable {
                provider: config.name.clone(),
                reason: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn model_ref(&self) -> &str {
        &self.config.model_ref
    }

    async fn available(&self) -> bool {
        let probe_timeout = Duration::from_secs(self.config.request_timeout_secs.min(5));
        let probe = self
            .authorized(self.client.get(self.endpoint("health")))
            .timeout(probe_timeout)
            .send()
            .await;
        match probe {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(provider = %self.config.name, %err, "health probe failed");
                false
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> DomainResult<String> {
        let response = self
            .authorized(self.client.post(self.endpoint("generate")))
            .json(request)
            .send()
            .await
            .map_err(|err| DomainError::ProviderFailed {
                provider: self.config.name.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::ProviderFailed {
                provider: self.config.name.clone(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|err| DomainError::ProviderFailed {
                    provider: self.config.name.clone(),
                    message: format!("malformed generate response: {err}"),
                })?;
        Ok(parsed.artifact_location)
    }
}
