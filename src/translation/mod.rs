/*!
 * Translation services for masked LaTeX content.
 *
 * This module contains the machinery between the pipeline and the LLM
 * providers. It is split into several submodules:
 *
 * - `service`: Core translation service with timeout/retry/backoff
 * - `chunking`: Prose-preserving chunking of masked buffers
 * - `terminology`: Terminology map construction and metadata extraction
 * - `prompts`: Prompt templates for translation, repair and terminology
 * - `cache`: Cache of verified chunk translations
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::service::{ExhaustedRetries, TranslationService};
pub use self::terminology::{DocumentMetadata, TerminologyBuilder, TerminologyMap};

// Submodules
pub mod cache;
pub mod chunking;
pub mod prompts;
pub mod service;
pub mod terminology;
