//! Generation Gateway: one bounded call to the generation service.
//!
//! Chat replies never fail on the backend: an unreachable service yields a
//! labelled simulated reply, and any other failure or an empty payload
//! yields a fixed apology. There is no retry. Structured (JSON) calls have
//! no sensible placeholder and surface failures instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use academaide_core::error::{Error, ProviderError, Result};
use academaide_core::provider::{GenerationRequest, GenerationService, OutputFormat};

use crate::prompt::AssembledPrompt;

/// Prefix of the reply served when the generation service is unreachable.
pub const SIMULATED_PREFIX: &str = "Simulated AI Response: ";

/// Reply served when generation succeeded but said nothing, or failed for
/// a reason other than reachability.
pub const UNABLE_TO_RESPOND: &str = "I'm having trouble thinking right now.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub text: String,
    /// True when `text` is a placeholder rather than model output.
    pub is_fallback: bool,
}

impl GenerationOutcome {
    fn model(text: String) -> Self {
        Self {
            text,
            is_fallback: false,
        }
    }

    fn fallback(text: String) -> Self {
        Self {
            text,
            is_fallback: true,
        }
    }
}

pub struct GenerationGateway {
    service: Arc<dyn GenerationService>,
    model: String,
    timeout: Duration,
}

impl GenerationGateway {
    pub fn new(service: Arc<dyn GenerationService>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            service,
            model: model.into(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a chat reply for `prompt`.
    ///
    /// The only error is [`Error::Cancelled`]. The simulated reply echoes
    /// `user_message` rather than the prompt so no academic context is
    /// written into the user-agnostic response cache.
    pub async fn reply(
        &self,
        prompt: &AssembledPrompt,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: prompt.text.clone(),
            stop: prompt.stop.clone(),
            format: OutputFormat::Text,
        };

        let outcome = match self.call(request, cancel).await? {
            Ok(text) if text.trim().is_empty() => {
                warn!(provider = self.service.name(), "Generation returned an empty reply");
                GenerationOutcome::fallback(UNABLE_TO_RESPOND.to_string())
            }
            Ok(text) => GenerationOutcome::model(text),
            Err(e @ (ProviderError::Network(_) | ProviderError::Timeout(_))) => {
                warn!(provider = self.service.name(), error = %e, "Generation unreachable, serving simulated reply");
                GenerationOutcome::fallback(format!("{SIMULATED_PREFIX}{user_message}"))
            }
            Err(e) => {
                warn!(provider = self.service.name(), error = %e, "Generation failed, serving placeholder");
                GenerationOutcome::fallback(UNABLE_TO_RESPOND.to_string())
            }
        };
        Ok(outcome)
    }

    /// Generate in JSON mode and return the raw text. Transport failures
    /// surface as [`Error::UpstreamUnavailable`].
    pub async fn generate_structured(&self, prompt: String, cancel: &CancellationToken) -> Result<String> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt,
            stop: Vec::new(),
            format: OutputFormat::Json,
        };
        Ok(self.call(request, cancel).await??)
    }

    /// One timed, cancellable attempt. The outer result carries
    /// cancellation; the inner one the provider outcome.
    async fn call(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<std::result::Result<String, ProviderError>> {
        let started = Instant::now();
        let attempt = tokio::time::timeout(self.timeout, self.service.generate(request));

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!(provider = self.service.name(), "Generation cancelled by caller");
                return Err(Error::Cancelled);
            }
            result = attempt => result,
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(Ok(response)) => {
                debug!(provider = self.service.name(), latency_ms, chars = response.text.len(), "Generation complete");
                Ok(Ok(response.text))
            }
            Ok(Err(e)) => Ok(Err(e)),
            Err(_) => Ok(Err(ProviderError::Timeout(format!(
                "'{}' timed out after {}s",
                self.service.name(),
                self.timeout.as_secs()
            )))),
        }
    }
}
