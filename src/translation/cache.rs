/*!
 * Translation caching functionality.
 *
 * In-memory cache for chunk translations, keyed on a digest of the
 * source text and language pair. The pipeline only stores translations
 * that passed verification, so a cached entry is always safe to reuse -
 * in particular a repair-driven re-translation never gets served the
 * rejected attempt back.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// Digest-based cache key for a (text, source, target) triple
fn cache_key(source_text: &str, source_language: &str, target_language: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(source_language.as_bytes());
    hasher.update([0]);
    hasher.update(target_language.as_bytes());
    hasher.update([0]);
    hasher.update(source_text.as_bytes());
    hasher.finalize().into()
}

/// Translation cache for storing and retrieving verified translations
#[derive(Debug, Default)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<[u8; 32], String>>>,
}

impl TranslationCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a verified translation from the cache
    pub fn get(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Option<String> {
        let key = cache_key(source_text, source_language, target_language);
        let hit = self.cache.read().get(&key).cloned();
        if hit.is_some() {
            debug!(
                "Cache hit for {} byte chunk ({} -> {})",
                source_text.len(),
                source_language,
                target_language
            );
        }
        hit
    }

    /// Store a verified translation in the cache
    pub fn store(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
        translation: &str,
    ) {
        let key = cache_key(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_storeAndGet_shouldRoundTrip() {
        let cache = TranslationCache::new();
        cache.store("hello", "en", "fr", "bonjour");

        assert_eq!(cache.get("hello", "en", "fr"), Some("bonjour".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_get_shouldDistinguishLanguagePairs() {
        let cache = TranslationCache::new();
        cache.store("hello", "en", "fr", "bonjour");

        assert_eq!(cache.get("hello", "en", "de"), None);
        assert_eq!(cache.get("hello", "fr", "en"), None);
    }

    #[test]
    fn test_cache_clone_shouldShareStorage() {
        let cache = TranslationCache::new();
        let other = cache.clone();
        cache.store("text", "en", "zh", "translated");

        assert_eq!(other.get("text", "en", "zh"), Some("translated".to_string()));
    }
}
