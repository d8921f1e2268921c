/*!
 * Ollama client for local LLM inference.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;

use super::{CompletionRequest, Provider};

/// Ollama client for interacting with the Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    system: String,
    /// Additional model parameters
    options: GenerationOptions,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationOptions {
    /// Temperature for generation
    temperature: f32,
    /// Maximum number of tokens to generate
    num_predict: u32,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    /// Generated text
    response: String,
}

/// Version response from the Ollama API
#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

impl Ollama {
    /// Create a new Ollama client from host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let base_url = if host.starts_with("http") {
            format!("{}:{}", host, port)
        } else {
            format!("http://{}:{}", host, port)
        };
        Self::from_url(base_url)
    }

    /// Create a new Ollama client from a complete URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            base_url: url.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Query the server version, used as a connectivity probe
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let parsed = response
            .json::<VersionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(parsed.version)
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerationRequest {
            model: request.model.clone(),
            prompt: request.user.clone(),
            system: request.system.clone(),
            options: GenerationOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(120)
                } else {
                    ProviderError::ConnectionError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(parsed.response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
