/*!
 * Terminology extraction and the shared terminology map.
 *
 * The terminology map is built once per project from the entry file's
 * title and abstract, then shared read-only across every translation
 * unit. The same source term therefore maps to the same target term in
 * every unit of a run.
 *
 * Building the map is a best-effort summarization call: when the
 * abstract is missing or the call fails, translation proceeds with an
 * empty map and a warning.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::providers::CompletionRequest;
use crate::translation::prompts;
use crate::translation::service::TranslationService;

static TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\title\s*\{((?:[^{}]|\{[^{}]*\})*)\}").expect("Invalid title regex")
});

static ABSTRACT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\begin\{abstract\}(.*?)\\end\{abstract\}").expect("Invalid abstract regex")
});

/// Immutable source-to-target term mapping, shared across units.
///
/// BTreeMap keeps iteration (and the JSON embedded in prompts)
/// deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminologyMap {
    terms: BTreeMap<String, String>,
}

impl TerminologyMap {
    /// Insert a term pair; used during construction only
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.terms.insert(source.into(), target.into());
    }

    /// Look up the target term for a source term
    pub fn get(&self, source: &str) -> Option<&str> {
        self.terms.get(source).map(String::as_str)
    }

    /// Number of term pairs
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the map holds no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate term pairs in deterministic order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Deterministic JSON rendering for prompt embedding
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.terms).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a map from model output, tolerating markdown code fences
    pub fn from_model_output(output: &str) -> Option<Self> {
        let stripped = strip_code_fences(output);
        serde_json::from_str::<BTreeMap<String, String>>(stripped.trim())
            .ok()
            .map(|terms| Self { terms })
    }
}

/// Extracted entry-file metadata used as terminology context
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    /// Paper title, comment-stripped
    pub title: Option<String>,
    /// Abstract body, comment-stripped
    pub abstract_text: Option<String>,
}

/// Extract title and abstract from entry-file content
pub fn extract_metadata(tex_content: &str) -> DocumentMetadata {
    let title = TITLE_REGEX
        .captures(tex_content)
        .map(|caps| clean_tex(&caps[1]));
    let abstract_text = ABSTRACT_REGEX
        .captures(tex_content)
        .map(|caps| clean_tex(&caps[1]));

    DocumentMetadata {
        title: title.filter(|t| !t.is_empty()),
        abstract_text: abstract_text.filter(|a| !a.is_empty()),
    }
}

/// Drop comment lines and collapse whitespace
fn clean_tex(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('%'))
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a leading markdown code fence from model output
fn strip_code_fences(output: &str) -> &str {
    let trimmed = output.trim();
    if let Some(inner) = trimmed.strip_prefix("```json") {
        return inner.trim_end_matches("```");
    }
    if let Some(inner) = trimmed.strip_prefix("```") {
        return inner.trim_end_matches("```");
    }
    trimmed
}

/// Builds the project terminology map from title/abstract context
pub struct TerminologyBuilder;

impl TerminologyBuilder {
    /// Build the terminology map once, before any unit is translated.
    ///
    /// Best effort: a missing abstract or a failed call yields an empty
    /// map, never an error.
    pub async fn build(
        service: &TranslationService,
        metadata: &DocumentMetadata,
    ) -> Arc<TerminologyMap> {
        let Some(abstract_text) = &metadata.abstract_text else {
            warn!("No abstract found; proceeding without terminology");
            return Arc::new(TerminologyMap::default());
        };

        let context = match &metadata.title {
            Some(title) => format!("Title: {}\n\nAbstract: {}", title, abstract_text),
            None => format!("Abstract: {}", abstract_text),
        };

        let system = prompts::terminology_system_prompt(
            &service.source_language,
            &service.target_language,
        );
        let request = CompletionRequest::new(service.model(), system, context)
            .temperature(0.0)
            .max_tokens(2048);

        match service.complete_with_retry(&request).await {
            Ok(output) => match TerminologyMap::from_model_output(&output) {
                Some(map) => {
                    info!("Terminology loaded: {} terms", map.len());
                    Arc::new(map)
                }
                None => {
                    warn!("Terminology output was not valid JSON; proceeding without terminology");
                    Arc::new(TerminologyMap::default())
                }
            },
            Err(e) => {
                warn!("Terminology generation failed: {}; proceeding without it", e);
                Arc::new(TerminologyMap::default())
            }
        }
    }
}
