/*!
 * # latrans - LaTeX project translation with AI
 *
 * A Rust library for translating multi-file LaTeX projects between
 * languages while guaranteeing that non-prose content survives
 * byte-for-byte.
 *
 * ## Features
 *
 * - Reversible masking of math, citations, labels and macro invocations
 * - Recursive discovery of `\input`/`\include` graphs, cycle safe
 * - Per-unit translate / verify / repair pipeline with bounded retries
 * - Structural verification (placeholder conservation, brace balance)
 * - Project-wide terminology consistency from title/abstract context
 * - Multiple AI providers: Ollama, OpenAI, Anthropic
 * - PDF compilation of the translated tree via latexmk
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `latex`: Span classification and masking:
 *   - `latex::classifier`: Protected/translatable span classification
 *   - `latex::masking`: Placeholder substitution with exact unmasking
 * - `project`: Document project model:
 *   - `project::walker`: Inclusion graph discovery
 *   - `project::unit`: Translation units and their state machine
 * - `translation`: AI-powered translation services:
 *   - `translation::service`: Provider dispatch with retry/backoff
 *   - `translation::chunking`: Prose-preserving chunking
 *   - `translation::terminology`: Shared terminology map
 * - `verification`: The Reflexion critic and its checks
 * - `pipeline`: The per-unit state machine driver and the fixer
 * - `providers`: Client implementations for LLM providers
 * - `compiler`: Preamble sanitation, font injection, latexmk
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod compiler;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod latex;
pub mod pipeline;
pub mod project;
pub mod providers;
pub mod translation;
pub mod verification;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, MaskingError, ProviderError, UnitFailure};
pub use latex::{MaskEngine, MaskTable};
pub use pipeline::{CancelFlag, UnitPipeline};
pub use project::{DocumentProject, RunReport, TranslationUnit, UnitState};
pub use translation::{TerminologyMap, TranslationService};
pub use verification::{ReflexionCritic, Verdict, Violation};
