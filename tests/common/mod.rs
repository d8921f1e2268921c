/*!
 * Common test utilities shared by the unit and integration suites.
 */

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use latrans::app_config::Config;
use latrans::providers::mock::MockProvider;
use latrans::translation::TranslationService;
use tempfile::TempDir;

/// Initialize test logging once; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A config tuned for tests: tiny backoff, no compilation
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "fr".to_string();
    config.translation.common.retry_count = 3;
    config.translation.common.retry_backoff_ms = 1;
    config.translation.common.timeout_secs = 5;
    config.pipeline.max_repair_attempts = 3;
    config.pipeline.max_concurrent_units = 2;
    config.compile.enabled = false;
    config
}

/// Wrap a mock provider in a translation service
pub fn mock_service(mock: MockProvider, config: &Config) -> Arc<TranslationService> {
    Arc::new(TranslationService::with_provider(
        Arc::new(mock),
        config.translation.clone(),
        config.source_language.clone(),
        config.target_language.clone(),
    ))
}

/// Write a set of (relative path, content) files into a temp dir
pub fn write_project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp project");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write project file");
    }
    let root = dir.path().to_path_buf();
    (dir, root)
}
