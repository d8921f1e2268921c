/*!
 * Core translation service implementation.
 *
 * Wraps a provider behind a uniform completion interface with the
 * timeout, bounded-retry and exponential-backoff policy every external
 * call in the pipeline is governed by. Transient failures are retried
 * until the attempt budget is spent; non-transient failures surface
 * immediately.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::app_config::{Config, TranslationConfig};
use crate::errors::ProviderError;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::{CompletionRequest, Provider};
use crate::translation::prompts;
use crate::translation::terminology::TerminologyMap;

use super::cache::TranslationCache;

/// A provider call that failed after its full retry budget
#[derive(Debug)]
pub struct ExhaustedRetries {
    /// Number of attempts made
    pub attempts: u32,
    /// The last error observed
    pub error: ProviderError,
}

impl std::fmt::Display for ExhaustedRetries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "after {} attempts: {}", self.attempts, self.error)
    }
}

/// Main translation service for masked LaTeX chunks
pub struct TranslationService {
    /// Provider implementation
    provider: Arc<dyn Provider>,
    /// Configuration for the translation service
    pub config: TranslationConfig,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Cache of verified chunk translations
    pub cache: TranslationCache,
}

impl TranslationService {
    /// Create a new translation service from the application config
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let translation = config.translation.clone();
        let provider: Arc<dyn Provider> = match translation.provider {
            crate::app_config::TranslationProvider::Ollama => {
                let settings = &translation.ollama;
                Arc::new(Ollama::from_url(settings.endpoint.clone()))
            }
            crate::app_config::TranslationProvider::OpenAI => {
                let settings = &translation.openai;
                Arc::new(OpenAI::new(settings.api_key.clone(), settings.endpoint.clone()))
            }
            crate::app_config::TranslationProvider::Anthropic => {
                let settings = &translation.anthropic;
                Arc::new(Anthropic::new(
                    settings.api_key.clone(),
                    settings.endpoint.clone(),
                ))
            }
        };

        Ok(Self {
            provider,
            config: translation,
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            cache: TranslationCache::new(),
        })
    }

    /// Create a service around an explicit provider, used by tests
    pub fn with_provider(
        provider: Arc<dyn Provider>,
        config: TranslationConfig,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            config,
            source_language: source_language.into(),
            target_language: target_language.into(),
            cache: TranslationCache::new(),
        }
    }

    /// Model name for the active provider
    pub fn model(&self) -> String {
        self.config.active_model().to_string()
    }

    /// Test the connection to the configured provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Complete a request under the timeout/retry/backoff policy.
    ///
    /// Makes at most `retry_count` attempts; a timeout counts as a
    /// transient failure until the budget is spent.
    pub async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, ExhaustedRetries> {
        let budget = self.config.common.retry_count.max(1);
        let timeout = Duration::from_secs(self.config.common.timeout_secs);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = tokio::time::timeout(timeout, self.provider.complete(request)).await;

            let error = match outcome {
                Ok(Ok(text)) => {
                    debug!(
                        "{} completed request on attempt {}/{}",
                        self.provider.name(),
                        attempt,
                        budget
                    );
                    return Ok(text);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.config.common.timeout_secs),
            };

            if !error.is_transient() || attempt >= budget {
                return Err(ExhaustedRetries {
                    attempts: attempt,
                    error,
                });
            }

            let backoff = self.backoff_delay(attempt);
            warn!(
                "{} attempt {}/{} failed transiently ({}); retrying in {} ms",
                self.provider.name(),
                attempt,
                budget,
                error,
                backoff.as_millis()
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// Exponential backoff with jitter for the given attempt number
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.common.retry_backoff_ms;
        let exp = base.saturating_mul(1u64 << (attempt - 1).min(8));
        let jitter = rand::rng().random_range(0..=base / 2 + 1);
        Duration::from_millis(exp + jitter)
    }

    /// Translate one masked chunk, constrained by the shared terminology
    pub async fn translate_chunk(
        &self,
        masked_chunk: &str,
        terminology: &TerminologyMap,
    ) -> Result<String, ExhaustedRetries> {
        let system = prompts::translator_system_prompt(
            &self.source_language,
            &self.target_language,
            terminology,
        );
        let request = CompletionRequest::new(self.model(), system, masked_chunk)
            .temperature(self.config.common.temperature)
            .max_tokens(self.config.common.max_tokens);

        self.complete_with_retry(&request).await
    }

    /// Run a constrained repair completion
    pub async fn repair_chunk(
        &self,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, ExhaustedRetries> {
        let request = CompletionRequest::new(self.model(), system_prompt, user_content)
            .temperature(0.2)
            .max_tokens(self.config.common.max_tokens);

        self.complete_with_retry(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::TranslationConfig;
    use crate::providers::mock::MockProvider;

    fn test_config(retries: u32) -> TranslationConfig {
        let mut config = TranslationConfig::default();
        config.common.retry_count = retries;
        config.common.retry_backoff_ms = 1;
        config.common.timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn test_completeWithRetry_withTransientProvider_shouldStopAtBudget() {
        let mock = Arc::new(MockProvider::transient());
        let counter = mock.call_counter();
        let service =
            TranslationService::with_provider(mock, test_config(3), "en", "fr");

        let request = CompletionRequest::new("m", "s", "u");
        let err = service.complete_with_retry(&request).await.unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert!(err.error.is_transient());
    }

    #[tokio::test]
    async fn test_completeWithRetry_withFlakyProvider_shouldRecover() {
        let mock = Arc::new(MockProvider::flaky(2));
        let service =
            TranslationService::with_provider(mock, test_config(5), "en", "fr");

        let request = CompletionRequest::new("m", "s", "u");
        let out = service.complete_with_retry(&request).await.unwrap();
        assert!(out.contains("u"));
    }

    #[tokio::test]
    async fn test_translateChunk_shouldCarryTerminologyInPrompt() {
        let mock = Arc::new(MockProvider::working());
        let service =
            TranslationService::with_provider(mock, test_config(1), "en", "de");

        let mut terminology = TerminologyMap::default();
        terminology.insert("graph", "Graph");

        let out = service
            .translate_chunk("A graph sentence.", &terminology)
            .await
            .unwrap();
        assert!(out.contains("A graph sentence."));
    }
}
