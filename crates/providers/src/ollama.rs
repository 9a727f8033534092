//! Ollama-protocol client.
//!
//! Speaks the native Ollama HTTP API rather than the OpenAI-compatible one:
//! - `POST /api/generate` for non-streaming completions
//! - `POST /api/embeddings` for single-text embeddings
//! - `GET /api/tags` for health checks

use async_trait::async_trait;
use academaide_core::error::ProviderError;
use academaide_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// A client for one Ollama endpoint.
///
/// Generation and embedding may live on different hosts, so the pipeline
/// usually holds two of these.
#[derive(Clone)]
pub struct OllamaClient {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "ollama".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client against `http://localhost:11434`.
    pub fn local() -> Result<Self, ProviderError> {
        Self::new("http://localhost:11434", Duration::from_secs(120))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_body(request: &GenerationRequest) -> ApiGenerateRequest<'_> {
        ApiGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            format: match request.format {
                OutputFormat::Text => None,
                OutputFormat::Json => Some("json"),
            },
            options: if request.stop.is_empty() {
                None
            } else {
                Some(ApiOptions {
                    stop: &request.stop,
                })
            },
        }
    }

    /// Map a non-success status into a provider error.
    async fn error_for_status(
        response: reqwest::Response,
        model: &str,
    ) -> std::result::Result<reqwest::Response, ProviderError> {
        let status = response.status().as_u16();
        if status == 200 {
            return Ok(response);
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(model.to_string()));
        }
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Ollama returned error");
        Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        })
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl GenerationService for OllamaClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::generate_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = Self::error_for_status(response, &request.model).await?;

        let api_response: ApiGenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidPayload(format!("Failed to parse response: {e}")))?;

        Ok(GenerationResponse {
            text: api_response.response,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_send_error)?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = ApiEmbeddingRequest {
            model: &request.model,
            prompt: &request.text,
        };

        debug!(
            provider = %self.name,
            model = %request.model,
            chars = request.text.len(),
            "Sending embedding request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = Self::error_for_status(response, &request.model).await?;

        let api_resp: ApiEmbeddingResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidPayload(format!("Failed to parse embedding response: {e}"))
        })?;

        if api_resp.embedding.is_empty() {
            return Err(ProviderError::InvalidPayload("Empty embedding".into()));
        }

        Ok(EmbeddingResponse {
            vector: narrow(&api_resp.embedding),
            model: request.model,
        })
    }
}

/// Ollama returns `f64`; pgvector stores `f32`.
fn narrow(values: &[f64]) -> Vec<f32> {
    values.iter().map(|v| *v as f32).collect()
}

// --- Ollama API types ---

#[derive(Debug, Serialize)]
struct ApiGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ApiOptions<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiOptions<'a> {
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ApiGenerateResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
}

#[derive(Debug, Serialize)]
struct ApiEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiEmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f64>,
}
