/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI API (and OpenAI-compatible local servers)
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: Scripted provider for tests
 */

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::ProviderError;

/// A single chat completion request, shared by all providers.
///
/// Providers translate this neutral form into their own wire format.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model name to use
    pub model: String,
    /// System prompt guiding the model
    pub system: String,
    /// User content to complete against
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request with the given model and content
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 4096,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Common trait for all LLM providers.
///
/// Implementations perform a single completion attempt; retry, backoff
/// and timeout policy live in the translation service so every provider
/// is governed by the same budget.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request, returning the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
