//! Model backend abstraction.
//!
//! The [`ModelBackend`] trait hides the code-generation model behind a single `generate` call so
//! the conversion pipeline can be exercised without a live model. [`OllamaBackend`] is the
//! production implementation speaking Ollama's `/api/generate` protocol; [`MockBackend`] (tests
//! and the `test-utils` feature) returns queued responses and records every prompt.

use crate::config::BackendConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[cfg(any(test, feature = "test-utils"))]
mod mock;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockBackend;

/// Failure to obtain generated text for a prompt.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, reset, DNS failure and similar
    #[error("Transport error: {0}")]
    Transport(String),

    /// No response within the configured per-call timeout
    #[error("Backend did not respond within {0:?}")]
    Timeout(Duration),

    /// Backend answered with a non-2xx status
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected JSON document
    #[error("Malformed backend response: {0}")]
    Decode(String),

    /// JSON body without a `response` field
    #[error("Backend response did not contain generated text")]
    MissingResponse,
}

impl BackendError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Transport(_) | BackendError::Timeout(_) => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::Decode(_) | BackendError::MissingResponse => false,
        }
    }
}

/// A code-generation model reachable by prompt.
///
/// Implementations must be safe to call concurrently; the converter issues one call per file and
/// runs several at once.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send a single prompt and return the raw generated text.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Body of an Ollama `/api/generate` request.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// The part of an Ollama generate response we care about.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: Option<String>,
}

/// Ollama backend over a pooled reqwest client.
#[derive(Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    url: Url,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        // reqwest is built without a bundled crypto provider; a second install is a no-op error
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    #[tracing::instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client.post(self.url.clone()).json(&body).send().await.map_err(|e| {
            tracing::error!(url = %self.url, error = %e, "Backend request failed");
            self.map_reqwest_error(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_reqwest_error(e))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), response_len = text.len(), "Backend returned error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))?;
        let generated = parsed.response.ok_or(BackendError::MissingResponse)?;

        tracing::debug!(response_len = generated.len(), "Backend generation completed");
        Ok(generated)
    }
}
