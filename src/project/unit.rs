/*!
 * Translation units and their processing states.
 *
 * A translation unit is one source file of a document project. Units
 * advance through an explicit state machine; transitions are driven by
 * the pipeline and every terminal state is recorded in the run report.
 */

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Processing state of a translation unit.
///
/// The happy path is `Pending → Masked → Translated → Verifying →
/// Verified → Unmasked → Done`; a failing verification detours through
/// `Repairing` back to `Translated`. `Failed` is terminal and reachable
/// from any state once a retry budget is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UnitState {
    /// Discovered, not yet processed
    Pending,
    /// Protected spans replaced by placeholders
    Masked,
    /// Translator produced output for every chunk
    Translated,
    /// Critic review in progress
    Verifying,
    /// Critic accepted the translation
    Verified,
    /// Fixer attempting to repair a failing translation
    Repairing,
    /// Placeholders restored
    Unmasked,
    /// Final text written, unit complete
    Done,
    /// Terminal failure; the cause is recorded
    Failed {
        /// Human-readable failure cause
        cause: String,
    },
}

impl UnitState {
    /// Whether this state ends processing for the unit
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Short label for logs and the report table
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Masked => "masked",
            Self::Translated => "translated",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
            Self::Repairing => "repairing",
            Self::Unmasked => "unmasked",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One source file of a document project
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// Absolute path of the file inside the sandbox
    pub path: PathBuf,
    /// Path relative to the project root, for reporting
    pub relative_path: PathBuf,
    /// Raw file content as discovered
    pub content: String,
    /// Direct inclusions, as resolved absolute paths
    pub includes: Vec<PathBuf>,
    /// Current processing state
    pub state: UnitState,
    /// Whether this is the project entry file
    pub is_entry: bool,
}

impl TranslationUnit {
    /// Create a freshly discovered unit in `Pending` state
    pub fn new(path: PathBuf, relative_path: PathBuf, content: String) -> Self {
        Self {
            path,
            relative_path,
            content,
            includes: Vec::new(),
            state: UnitState::Pending,
            is_entry: false,
        }
    }

    /// Display name for logs
    pub fn name(&self) -> String {
        self.relative_path.display().to_string()
    }
}
