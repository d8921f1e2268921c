// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use crate::app_config::{Config, TranslationProvider};
use app_controller::Controller;
use pipeline::CancelFlag;

mod app_config;
mod app_controller;
mod compiler;
mod errors;
mod file_utils;
mod language_utils;
mod latex;
mod pipeline;
mod project;
mod providers;
mod translation;
mod verification;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a LaTeX project directory (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Generate shell completions for latrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input directory containing the LaTeX project sources
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Output directory for the translated project
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh', 'fr', 'de')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip translation and only sanitize/compile
    #[arg(long)]
    skip_translation: bool,
}

/// latrans - LaTeX project translation with AI
///
/// Translates multi-file LaTeX projects between languages while keeping
/// math, citations, labels and macro invocations byte-for-byte intact.
#[derive(Parser, Debug)]
#[command(name = "latrans")]
#[command(version)]
#[command(about = "AI-powered LaTeX project translation")]
#[command(long_about = "latrans translates whole LaTeX projects with an LLM while guaranteeing that \
math, citations, labels and macro invocations survive unchanged.

EXAMPLES:
    latrans ./paper-src                        # Translate using default config
    latrans -s en -t zh ./paper-src            # English to Chinese
    latrans -p openai -m gpt-4o ./paper-src    # Use a specific provider and model
    latrans --skip-translation ./paper-src     # Compile-only run
    latrans completions bash > latrans.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input directory containing the LaTeX project sources
    #[arg(value_name = "INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Output directory for the translated project
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh', 'fr', 'de')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip translation and only sanitize/compile
    #[arg(long)]
    skip_translation: bool,
}

impl CommandLineOptions {
    /// Assemble translate arguments from the top-level options
    fn into_translate_args(self) -> Option<TranslateArgs> {
        Some(TranslateArgs {
            input_dir: self.input_dir?,
            output_dir: self.output_dir,
            provider: self.provider,
            model: self.model,
            source_language: self.source_language,
            target_language: self.target_language,
            config_path: self.config_path,
            log_level: self.log_level,
            skip_translation: self.skip_translation,
        })
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the configuration file, creating a default one when absent.
/// Falls back to the per-user config directory before creating anything.
fn load_or_create_config(path: &str) -> Result<Config> {
    if file_utils::FileManager::file_exists(path) {
        return Config::from_file(path);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("latrans").join("conf.json");
        if file_utils::FileManager::file_exists(&global) {
            return Config::from_file(global);
        }
    }

    let config = Config::default();
    if let Err(e) = config.save(path) {
        warn!("Could not write default config to {}: {}", path, e);
    } else {
        info!("Created default configuration at {}", path);
    }
    Ok(config)
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(mut config: Config, args: &TranslateArgs) -> Result<Config> {
    if let Some(provider) = &args.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &args.model {
        match config.translation.provider {
            TranslationProvider::Ollama => config.translation.ollama.model = model.clone(),
            TranslationProvider::OpenAI => config.translation.openai.model = model.clone(),
            TranslationProvider::Anthropic => config.translation.anthropic.model = model.clone(),
        }
    }
    if let Some(source) = &args.source_language {
        config.source_language = language_utils::validate_code(source)?;
    }
    if let Some(target) = &args.target_language {
        config.target_language = language_utils::validate_code(target)?;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone().into();
    }
    config.validate()?;
    Ok(config)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let config = apply_overrides(load_or_create_config(&args.config_path)?, &args)?;
    log::set_max_level(config.log_level.to_level_filter());

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancellation requested; finishing in-flight transitions");
                cancel.cancel();
            }
        });
    }

    let controller = Controller::with_config(config)?;
    let report = controller
        .run(args.input_dir, args.output_dir, args.skip_translation, cancel)
        .await?;

    if !args.skip_translation && !report.any_succeeded() {
        return Err(anyhow!(
            "No translation unit completed successfully ({} failed)",
            report.failed_count()
        ));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default.
    // The level is tightened after the config is loaded.
    CustomLogger::init(LevelFilter::Info)?;

    let mut cli = CommandLineOptions::parse();

    let result = match cli.command.take() {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => match cli.into_translate_args() {
            Some(args) => run_translate(args).await,
            None => {
                CommandLineOptions::command().print_help()?;
                Ok(())
            }
        },
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}
