/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds, prefixing prose
 * - `MockProvider::dropping_placeholders()` - Keeps dropping a placeholder
 * - `MockProvider::transient()` - Always fails with a transient error
 * - `MockProvider::flaky(n)` - Fails transiently n times, then succeeds
 * - `MockProvider::drop_then_fix()` - Drops a placeholder once, then behaves
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::latex::masking::PLACEHOLDER_REGEX;

use super::{CompletionRequest, Provider};

/// Prefix the working mock puts in front of every completion, so tests
/// can assert that prose actually changed.
pub const MOCK_TRANSLATION_PREFIX: &str = "[translated] ";

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a prefixed translation
    Working,
    /// Succeeds but removes the first placeholder from every response
    DroppingPlaceholders,
    /// Always fails with a transient connection error
    Transient,
    /// Fails transiently for the first N calls, then succeeds
    Flaky {
        /// Number of leading calls that fail
        fail_first: usize,
    },
    /// First call drops a placeholder, every later call is correct
    DropThenFix,
}

/// Mock provider for testing pipeline behavior without a live endpoint
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of completion calls made so far
    calls: Arc<AtomicUsize>,
    /// Every request seen, for asserting on prompt content
    seen: Arc<parking_lot::Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that keeps dropping the first placeholder
    pub fn dropping_placeholders() -> Self {
        Self::new(MockBehavior::DroppingPlaceholders)
    }

    /// Create a mock that always fails transiently
    pub fn transient() -> Self {
        Self::new(MockBehavior::Transient)
    }

    /// Create a mock that fails transiently `fail_first` times
    pub fn flaky(fail_first: usize) -> Self {
        Self::new(MockBehavior::Flaky { fail_first })
    }

    /// Create a mock that drops a placeholder once, then behaves
    pub fn drop_then_fix() -> Self {
        Self::new(MockBehavior::DropThenFix)
    }

    /// Handle to the call counter, for asserting exact retry counts
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Handle to the request log, for asserting on prompt content
    pub fn request_log(&self) -> Arc<parking_lot::Mutex<Vec<CompletionRequest>>> {
        self.seen.clone()
    }

    /// Pretend-translate: keep every placeholder, prefix the text
    fn translate(user: &str) -> String {
        format!("{}{}", MOCK_TRANSLATION_PREFIX, user)
    }

    /// Remove the first placeholder token from the text, if any
    fn drop_first_placeholder(text: &str) -> String {
        match PLACEHOLDER_REGEX.find(text) {
            Some(found) => {
                let mut out = String::with_capacity(text.len());
                out.push_str(&text[..found.start()]);
                out.push_str(&text[found.end()..]);
                out
            }
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => Ok(Self::translate(&request.user)),
            MockBehavior::DroppingPlaceholders => {
                Ok(Self::drop_first_placeholder(&Self::translate(&request.user)))
            }
            MockBehavior::Transient => Err(ProviderError::ConnectionError(
                "mock connection refused".to_string(),
            )),
            MockBehavior::Flaky { fail_first } => {
                if call < fail_first {
                    Err(ProviderError::ConnectionError(
                        "mock flaky failure".to_string(),
                    ))
                } else {
                    Ok(Self::translate(&request.user))
                }
            }
            MockBehavior::DropThenFix => {
                if call == 0 {
                    Ok(Self::drop_first_placeholder(&Self::translate(&request.user)))
                } else {
                    Ok(Self::translate(&request.user))
                }
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Transient => Err(ProviderError::ConnectionError(
                "mock connection refused".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
