use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Pipeline bounds
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Compilation settings
    #[serde(default)]
    pub compile: CompileConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            target_language: "zh".to_string(),
            translation: TranslationConfig::default(),
            pipeline: PipelineConfig::default(),
            compile: CompileConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            )
        })?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path.as_ref(), e))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language cannot be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language cannot be empty"));
        }
        if self.source_language == self.target_language {
            return Err(anyhow!(
                "Source and target language must differ ({})",
                self.source_language
            ));
        }
        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }
        if self.pipeline.max_repair_attempts == 0 {
            return Err(anyhow!("max_repair_attempts must be at least 1"));
        }
        if self.pipeline.max_concurrent_units == 0 {
            return Err(anyhow!("max_concurrent_units must be at least 1"));
        }
        for (name, settings) in [
            ("ollama", &self.translation.ollama),
            ("openai", &self.translation.openai),
            ("anthropic", &self.translation.anthropic),
        ] {
            if !settings.endpoint.is_empty() {
                url::Url::parse(&settings.endpoint)
                    .map_err(|e| anyhow!("Invalid {} endpoint: {}", name, e))?;
            }
        }
        Ok(())
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Settings shared by all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommonSettings {
    /// Sampling temperature for translation calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Total attempt budget for a transient-failing call
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff time in milliseconds for exponential backoff
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum characters per translation chunk
    #[serde(default = "default_max_chars_per_chunk")]
    pub max_chars_per_chunk: usize,

    /// Maximum tokens to generate per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            max_chars_per_chunk: default_max_chars_per_chunk(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Per-provider connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderSettings {
    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,
}

impl ProviderSettings {
    fn new(model: &str, endpoint: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key: String::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Active provider
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: CommonSettings,

    /// Ollama connection settings
    #[serde(default = "default_ollama_settings")]
    pub ollama: ProviderSettings,

    /// OpenAI connection settings
    #[serde(default = "default_openai_settings")]
    pub openai: ProviderSettings,

    /// Anthropic connection settings
    #[serde(default = "default_anthropic_settings")]
    pub anthropic: ProviderSettings,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            common: CommonSettings::default(),
            ollama: default_ollama_settings(),
            openai: default_openai_settings(),
            anthropic: default_anthropic_settings(),
        }
    }
}

impl TranslationConfig {
    /// Model name of the active provider
    pub fn active_model(&self) -> &str {
        match self.provider {
            TranslationProvider::Ollama => &self.ollama.model,
            TranslationProvider::OpenAI => &self.openai.model,
            TranslationProvider::Anthropic => &self.anthropic.model,
        }
    }
}

/// Bounds for the per-unit pipeline
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum repair attempts before a unit fails
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: u32,

    /// Maximum units processed concurrently
    #[serde(default = "default_max_concurrent_units")]
    pub max_concurrent_units: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_repair_attempts: default_max_repair_attempts(),
            max_concurrent_units: default_max_concurrent_units(),
        }
    }
}

/// PDF compilation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompileConfig {
    /// Whether to compile the translated tree to PDF
    #[serde(default = "default_compile_enabled")]
    pub enabled: bool,

    /// Compilation timeout in seconds
    #[serde(default = "default_compile_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            enabled: default_compile_enabled(),
            timeout_secs: default_compile_timeout_secs(),
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_temperature() -> f32 {
    0.3
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_chars_per_chunk() -> usize {
    4000
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_repair_attempts() -> u32 {
    3
}

fn default_max_concurrent_units() -> usize {
    4
}

fn default_compile_enabled() -> bool {
    true
}

fn default_compile_timeout_secs() -> u64 {
    300
}

fn default_ollama_settings() -> ProviderSettings {
    ProviderSettings::new("llama3.2:3b", "http://localhost:11434")
}

fn default_openai_settings() -> ProviderSettings {
    ProviderSettings::new("gpt-4o", "")
}

fn default_anthropic_settings() -> ProviderSettings {
    ProviderSettings::new("claude-3-5-sonnet-latest", "")
}
