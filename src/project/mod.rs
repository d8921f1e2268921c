/*!
 * Document project model and run reporting.
 *
 * A document project is a snapshot of a multi-file LaTeX source tree:
 * the sandbox root, the entry file, and the translation units discovered
 * by the walker. The project owns its units; the run report records each
 * unit's terminal state for downstream consumption.
 */

pub mod unit;
pub mod walker;

pub use unit::{TranslationUnit, UnitState};
pub use walker::{discover, find_entry_file, DiscoveredGraph, DiscoveryWarning};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discovered multi-file document project.
///
/// Created once per run from the sandbox snapshot; the unit set is fixed
/// after discovery, only per-unit translated output changes afterwards.
#[derive(Debug)]
pub struct DocumentProject {
    /// Sandbox root directory
    pub root: PathBuf,
    /// Entry file, always present in the unit set
    pub entry: PathBuf,
    /// All discovered translation units, entry first
    pub units: Vec<TranslationUnit>,
    /// Non-fatal discovery findings
    pub warnings: Vec<DiscoveryWarning>,
}

impl DocumentProject {
    /// Discover a project from a sandbox root and entry file
    pub fn discover(root: PathBuf, entry: PathBuf) -> anyhow::Result<Self> {
        let graph = walker::discover(&root, &entry)?;
        debug_assert!(
            graph.units.iter().any(|u| u.is_entry),
            "entry file must be present in the unit set"
        );
        Ok(Self {
            root,
            entry,
            units: graph.units,
            warnings: graph.warnings,
        })
    }
}

/// Terminal outcome of one unit, as serialized into the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutcome {
    /// Unit path relative to the project root
    pub path: String,
    /// Terminal state label (`done` or `failed`)
    pub state: String,
    /// Failure cause, present only for failed units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Number of chunks the unit was split into
    pub chunks: usize,
    /// Number of placeholders masked in the unit
    pub masked_spans: usize,
    /// Wall-clock processing time in milliseconds
    pub duration_ms: u64,
}

/// Structured report covering a whole run.
///
/// The run always completes and reports per-unit status; a failed unit
/// never aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Per-unit outcomes in discovery order
    pub units: Vec<UnitOutcome>,
    /// Discovery warnings rendered as strings
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Number of units that reached `Done`
    pub fn done_count(&self) -> usize {
        self.units.iter().filter(|u| u.state == "done").count()
    }

    /// Number of units that terminated in `Failed`
    pub fn failed_count(&self) -> usize {
        self.units.iter().filter(|u| u.state == "failed").count()
    }

    /// Whether at least one unit was translated successfully
    pub fn any_succeeded(&self) -> bool {
        self.done_count() > 0
    }

    /// Render the per-unit status table for the console
    pub fn table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Run {} - {}/{} units done\n",
            self.run_id,
            self.done_count(),
            self.units.len()
        ));
        for unit in &self.units {
            match &unit.cause {
                Some(cause) => out.push_str(&format!(
                    "  {:<40} {:<8} {}\n",
                    unit.path, unit.state, cause
                )),
                None => out.push_str(&format!(
                    "  {:<40} {:<8} {} spans, {} chunks, {} ms\n",
                    unit.path, unit.state, unit.masked_spans, unit.chunks, unit.duration_ms
                )),
            }
        }
        out
    }
}
