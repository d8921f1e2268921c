use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::Config;
use crate::compiler::{self, CompileService};
use crate::file_utils::FileManager;
use crate::pipeline::{CancelFlag, UnitPipeline};
use crate::project::{self, DocumentProject, RunReport, UnitOutcome, UnitState};
use crate::translation::{DocumentMetadata, TerminologyBuilder, TranslationService};

// @module: Application controller for LaTeX project translation

/// Main application controller for translating a document project
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Service override used by tests to inject a mock provider
    service_override: Option<Arc<TranslationService>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            service_override: None,
        })
    }

    /// Create a controller around an explicit translation service
    pub fn with_service(config: Config, service: Arc<TranslationService>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            service_override: Some(service),
        })
    }

    /// Run the full workflow: sandbox, discovery, translation, report,
    /// compilation. Always produces a run report; a single unit's
    /// failure never aborts the run.
    pub async fn run(
        &self,
        input_dir: PathBuf,
        output_dir: PathBuf,
        skip_translation: bool,
        cancel: CancelFlag,
    ) -> Result<RunReport> {
        let started_at = Utc::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let project_name = input_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        let project_dir = output_dir.join(&project_name);
        let sandbox = project_dir.join(format!("source_{}", self.config.target_language));
        let logs_dir = project_dir.join("logs");

        // Fresh sandbox snapshot per run; the input tree is never touched
        if sandbox.exists() {
            std::fs::remove_dir_all(&sandbox)
                .with_context(|| format!("Failed to clear sandbox {:?}", sandbox))?;
        }
        FileManager::ensure_dir(&logs_dir)?;
        let copied = FileManager::copy_dir_recursive(&input_dir, &sandbox)?;
        info!("Sandboxed {} files into {}", copied, sandbox.display());

        // Entry discovery is the only run-fatal step: without an entry
        // file there is no unit to process at all.
        let entry = project::find_entry_file(&sandbox)?;
        info!("Entry file: {}", entry.display());

        // Preamble sanitation is applied to the entry unit before any
        // masking happens.
        let entry_content = FileManager::read_to_string(&entry)?;
        let sanitized = compiler::sanitize_preamble(&entry_content);
        if sanitized != entry_content {
            FileManager::write_to_file(&entry, &sanitized)?;
            info!("Sanitized entry preamble");
        }

        let mut outcomes: Vec<UnitOutcome> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        if skip_translation {
            info!("Skipping translation phase");
        } else {
            let service = match &self.service_override {
                Some(service) => service.clone(),
                None => Arc::new(TranslationService::new(&self.config)?),
            };

            // Terminology is built once, before any unit is translated,
            // and shared read-only across all units.
            let metadata = crate::translation::terminology::extract_metadata(&sanitized);
            self.log_metadata(&metadata);
            let terminology = TerminologyBuilder::build(&service, &metadata).await;
            if !terminology.is_empty() {
                FileManager::write_to_file(
                    logs_dir.join("terminology.json"),
                    &terminology.to_json(),
                )?;
            }

            let document_project = DocumentProject::discover(sandbox.clone(), entry.clone())?;
            warnings = document_project
                .warnings
                .iter()
                .map(|w| w.to_string())
                .collect();

            outcomes = self
                .translate_units(document_project, service, terminology, &logs_dir, cancel)
                .await?;
        }

        let report = RunReport {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            source_language: self.config.source_language.clone(),
            target_language: self.config.target_language.clone(),
            units: outcomes,
            warnings,
        };
        FileManager::write_to_file(
            logs_dir.join("report.json"),
            &serde_json::to_string_pretty(&report)?,
        )?;
        info!("\n{}", report.table());

        let translated_anything = skip_translation || report.any_succeeded();
        if self.config.compile.enabled && translated_anything {
            self.compile_phase(&sandbox, &entry, &project_dir).await;
        } else if !translated_anything {
            warn!("No unit reached done; skipping compilation");
        }

        Ok(report)
    }

    /// Process all units concurrently, bounded by the configured limit.
    /// Returns outcomes in discovery order.
    async fn translate_units(
        &self,
        document_project: DocumentProject,
        service: Arc<TranslationService>,
        terminology: Arc<crate::translation::TerminologyMap>,
        logs_dir: &Path,
        cancel: CancelFlag,
    ) -> Result<Vec<UnitOutcome>> {
        let unit_count = document_project.units.len();
        let pipeline = Arc::new(UnitPipeline::new(
            service,
            terminology,
            &self.config,
            cancel,
        ));

        let progress = ProgressBar::new(unit_count as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let results = stream::iter(document_project.units.into_iter().enumerate())
            .map(|(index, mut unit)| {
                let pipeline = pipeline.clone();
                let progress = progress.clone();
                async move {
                    progress.set_message(unit.name());
                    let outcome = pipeline.process(&mut unit).await;
                    progress.inc(1);
                    (index, unit, outcome)
                }
            })
            .buffer_unordered(self.config.pipeline.max_concurrent_units)
            .collect::<Vec<_>>()
            .await;
        progress.finish_and_clear();

        // Restore discovery order for the report
        let mut results = results;
        results.sort_by_key(|(index, _, _)| *index);

        let mut outcomes = Vec::with_capacity(unit_count);
        for (_, unit, processed) in results {
            // Persist the mask table for audit regardless of outcome
            let audit_name = format!(
                "{}.masks.json",
                unit.relative_path.display().to_string().replace(['/', '\\'], "_")
            );
            if let Ok(json) = serde_json::to_string_pretty(&processed.mask_table) {
                if let Err(e) = FileManager::write_to_file(logs_dir.join(audit_name), &json) {
                    warn!("Could not persist mask table for {}: {}", unit.name(), e);
                }
            }

            if let Some(final_text) = &processed.final_text {
                FileManager::write_to_file(&unit.path, final_text)?;
            }

            let (state_label, cause) = match &processed.state {
                UnitState::Failed { cause } => ("failed", Some(cause.clone())),
                UnitState::Done => ("done", None),
                other => (other.label(), None),
            };
            outcomes.push(UnitOutcome {
                path: unit.name(),
                state: state_label.to_string(),
                cause,
                chunks: processed.chunks,
                masked_spans: processed.mask_table.len(),
                duration_ms: processed.duration.as_millis() as u64,
            });
        }

        Ok(outcomes)
    }

    /// Sanitize the whole tree, inject fonts, run latexmk, export PDF
    async fn compile_phase(&self, sandbox: &Path, entry: &Path, project_dir: &Path) {
        if let Err(e) = compiler::sanitize_project(sandbox) {
            warn!("Project sanitation failed: {}", e);
        }
        if let Err(e) = compiler::inject_cjk_fonts(entry, &self.config.target_language) {
            warn!("Font injection failed: {}", e);
        }

        let compile_service = CompileService::new(self.config.compile.timeout_secs);
        match compile_service.compile(sandbox, entry).await {
            Ok(outcome) => {
                let export = project_dir.join(format!(
                    "paper_{}.pdf",
                    self.config.target_language
                ));
                match FileManager::copy_file(&outcome.pdf_path, &export) {
                    Ok(()) => info!("PDF exported to {}", export.display()),
                    Err(e) => warn!("Could not export PDF: {}", e),
                }
            }
            Err(e) => {
                warn!("Compilation failed: {}", e);
            }
        }
    }

    fn log_metadata(&self, metadata: &DocumentMetadata) {
        match &metadata.title {
            Some(title) => info!("Title: {}", title),
            None => warn!("No title found in entry file"),
        }
        if metadata.abstract_text.is_none() {
            warn!("No abstract found in entry file");
        }
    }
}
