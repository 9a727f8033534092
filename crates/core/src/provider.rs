//! Model endpoint traits: text generation and text embedding.
//!
//! Both models are external, stochastic services reached over a single
//! synchronous call. The pipeline never streams: a request goes out, one
//! complete payload comes back.
//!
//! Implementations: Ollama-protocol HTTP client, scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Shape the generation service should answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Free text.
    #[default]
    Text,
    /// Ask the backend to constrain output to JSON.
    Json,
}

/// A non-streaming generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,

    /// The fully rendered prompt.
    pub prompt: String,

    /// Sequences at which the model must stop producing output.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    #[serde(default)]
    pub format: OutputFormat,
}

/// A complete generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text. May be empty.
    pub text: String,

    /// Which model actually responded.
    pub model: String,
}

/// An embedding request for a single text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub text: String,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vector, already narrowed to `f32`.
    pub vector: Vec<f32>,
    pub model: String,
}

/// The generation backend.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send one prompt and wait for the complete reply.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError>;

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

/// The embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Map text to a fixed-length vector.
    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError>;
}
