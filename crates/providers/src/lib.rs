//! Model endpoint implementations for AcademAide.
//!
//! The Ollama client implements both `academaide_core::GenerationService`
//! and `academaide_core::EmbeddingProvider`.

pub mod ollama;

pub use ollama::OllamaClient;

use academaide_core::error::ProviderError;
use academaide_core::{EmbeddingProvider, GenerationService};
use std::sync::Arc;
use std::time::Duration;

/// The two model endpoints the pipeline talks to.
#[derive(Clone)]
pub struct Providers {
    pub generation: Arc<dyn GenerationService>,
    pub embedding: Arc<dyn EmbeddingProvider>,
}

/// Build providers from configuration.
pub fn build_from_config(config: &academaide_config::AppConfig) -> Result<Providers, ProviderError> {
    let generation = OllamaClient::new(&config.generation.base_url, config.generation_timeout())?;

    // Embedding calls are short; the generation timeout is far too generous.
    let embedding = OllamaClient::new(&config.embedding.base_url, Duration::from_secs(30))?;

    tracing::debug!(
        generation_url = %generation.base_url(),
        embedding_url = %embedding.base_url(),
        "Built Ollama providers"
    );

    Ok(Providers {
        generation: Arc::new(generation),
        embedding: Arc::new(embedding),
    })
}
