/*!
 * End-to-end project workflow: sandbox, discovery, translation, report.
 */

use latrans::app_controller::Controller;
use latrans::file_utils::FileManager;
use latrans::pipeline::CancelFlag;
use latrans::providers::mock::{MockProvider, MOCK_TRANSLATION_PREFIX};
use tempfile::TempDir;

use crate::common::{mock_service, test_config, write_project};

const MAIN_TEX: &str = "\\documentclass{article}\n\
\\title{A Tiny Paper}\n\
\\begin{document}\n\
This sentence is prose with $x=1$ and \\cite{foo}.\n\
\\input{sec1}\n\
\\end{document}\n";

const SEC1_TEX: &str = "A second prose sentence with $x=1$ and \\cite{foo}.\n";

#[tokio::test]
async fn test_run_withTwoFileProject_shouldTranslateBothAndPreserveProtectedContent() {
    let (_guard, input) = write_project(&[("main.tex", MAIN_TEX), ("sec1.tex", SEC1_TEX)]);
    let output = TempDir::new().unwrap();

    let config = test_config();
    let controller = Controller::with_service(
        config.clone(),
        mock_service(MockProvider::working(), &config),
    )
    .unwrap();

    let report = controller
        .run(
            input.clone(),
            output.path().to_path_buf(),
            false,
            CancelFlag::new(),
        )
        .await
        .unwrap();

    // Both units reached done
    assert_eq!(report.units.len(), 2);
    assert_eq!(report.done_count(), 2);
    assert_eq!(report.failed_count(), 0);

    let project_name = input.file_name().unwrap().to_string_lossy().to_string();
    let sandbox = output
        .path()
        .join(&project_name)
        .join(format!("source_{}", config.target_language));

    for file in ["main.tex", "sec1.tex"] {
        let translated = FileManager::read_to_string(sandbox.join(file)).unwrap();
        // Protected content survives byte-for-byte
        assert!(translated.contains("$x=1$"), "{}: math lost", file);
        assert!(translated.contains("\\cite{foo}"), "{}: citation lost", file);
        // Prose actually changed
        assert!(
            translated.contains(MOCK_TRANSLATION_PREFIX),
            "{}: prose untranslated",
            file
        );
    }

    // The input tree was never modified
    assert_eq!(
        FileManager::read_to_string(input.join("main.tex")).unwrap(),
        MAIN_TEX
    );

    // Persisted artifacts: report and per-unit mask tables
    let logs = output.path().join(&project_name).join("logs");
    assert!(FileManager::file_exists(logs.join("report.json")));
    assert!(FileManager::file_exists(logs.join("main.tex.masks.json")));
    assert!(FileManager::file_exists(logs.join("sec1.tex.masks.json")));
}

#[tokio::test]
async fn test_run_withTransientProvider_shouldReportFailuresWithoutAborting() {
    let (_guard, input) = write_project(&[("main.tex", MAIN_TEX), ("sec1.tex", SEC1_TEX)]);
    let output = TempDir::new().unwrap();

    let config = test_config();
    let controller = Controller::with_service(
        config.clone(),
        mock_service(MockProvider::transient(), &config),
    )
    .unwrap();

    // The run itself completes; failures are recorded per unit
    let report = controller
        .run(
            input,
            output.path().to_path_buf(),
            false,
            CancelFlag::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.units.len(), 2);
    assert_eq!(report.done_count(), 0);
    assert_eq!(report.failed_count(), 2);
    for unit in &report.units {
        let cause = unit.cause.as_deref().unwrap_or_default();
        assert!(
            cause.contains("Transient collaborator error"),
            "unexpected cause: {}",
            cause
        );
    }
}

#[tokio::test]
async fn test_run_withMissingInclude_shouldWarnAndTranslateTheRest() {
    let main = "\\documentclass{article}\n\
\\begin{document}\n\
Prose before a missing include.\n\
\\input{ghost}\n\
\\end{document}\n";
    let (_guard, input) = write_project(&[("main.tex", main)]);
    let output = TempDir::new().unwrap();

    let config = test_config();
    let controller = Controller::with_service(
        config.clone(),
        mock_service(MockProvider::working(), &config),
    )
    .unwrap();

    let report = controller
        .run(
            input,
            output.path().to_path_buf(),
            false,
            CancelFlag::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.units.len(), 1);
    assert_eq!(report.done_count(), 1);
    assert!(
        report.warnings.iter().any(|w| w.contains("ghost")),
        "missing include should surface as a warning: {:?}",
        report.warnings
    );
}

#[tokio::test]
async fn test_run_withSkipTranslation_shouldLeaveSourcesUntouched() {
    let (_guard, input) = write_project(&[("main.tex", MAIN_TEX)]);
    let output = TempDir::new().unwrap();

    let config = test_config();
    let controller = Controller::with_config(config.clone()).unwrap();

    let report = controller
        .run(
            input.clone(),
            output.path().to_path_buf(),
            true,
            CancelFlag::new(),
        )
        .await
        .unwrap();

    assert!(report.units.is_empty());

    let project_name = input.file_name().unwrap().to_string_lossy().to_string();
    let sandbox_main = output
        .path()
        .join(&project_name)
        .join(format!("source_{}", config.target_language))
        .join("main.tex");
    // Sandbox copy exists and still holds the original prose
    let content = FileManager::read_to_string(sandbox_main).unwrap();
    assert!(content.contains("This sentence is prose"));
}
