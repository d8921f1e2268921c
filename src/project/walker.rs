/*!
 * Document graph discovery.
 *
 * Starting from the entry file, the walker resolves `\input` and
 * `\include` directives into a directed graph of translation units. Each
 * physical file is visited at most once - the visited set is keyed on
 * canonicalized paths, which makes diamond inclusion cheap and inclusion
 * cycles terminate at the second visit. Missing includes are reported as
 * warnings and excluded from the unit set, never treated as fatal.
 */

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::file_utils::FileManager;

use super::unit::TranslationUnit;

/// Pattern for file inclusion directives
static INCLUDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:input|include)\s*\{([^{}]+)\}").expect("Invalid include regex")
});

/// Entry-file basenames tried in order before falling back to the first
/// candidate containing `\documentclass`
const ENTRY_PRIORITIES: &[&str] = &["main.tex", "paper.tex", "article.tex"];

/// Non-fatal findings produced during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// An inclusion directive pointed at a file that does not exist
    MissingInclude {
        /// Unit containing the directive
        from: PathBuf,
        /// The unresolved target as written
        target: String,
    },
    /// Traversal reached an already-visited unit and stopped there
    CycleTruncated {
        /// The unit at which traversal was truncated
        at: PathBuf,
    },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInclude { from, target } => {
                write!(f, "unresolved include '{}' in {}", target, from.display())
            }
            Self::CycleTruncated { at } => {
                write!(f, "inclusion cycle truncated at {}", at.display())
            }
        }
    }
}

/// Result of walking the inclusion graph
#[derive(Debug)]
pub struct DiscoveredGraph {
    /// Units in deterministic discovery order, entry first
    pub units: Vec<TranslationUnit>,
    /// Non-fatal findings
    pub warnings: Vec<DiscoveryWarning>,
}

/// Locate the project entry file under `root`.
///
/// Scans for `.tex` files containing `\documentclass`, preferring the
/// conventional basenames, then the first candidate in walk order.
pub fn find_entry_file(root: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "tex") {
            match FileManager::read_to_string(path) {
                Ok(content) if content.contains("\\documentclass") => {
                    candidates.push(path.to_path_buf());
                }
                Ok(_) => {}
                Err(e) => warn!("Could not read {}: {}", path.display(), e),
            }
        }
    }

    if candidates.is_empty() {
        return Err(anyhow!(
            "No .tex file with \\documentclass found under {}",
            root.display()
        ));
    }

    for priority in ENTRY_PRIORITIES {
        if let Some(found) = candidates.iter().find(|c| {
            c.file_name()
                .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case(priority))
        }) {
            return Ok(found.clone());
        }
    }

    Ok(candidates.remove(0))
}

/// Resolve an inclusion target against the including file's directory,
/// then against the project root. Appends `.tex` when no extension is
/// present.
pub fn resolve_include(root: &Path, current_file: &Path, target: &str) -> Option<PathBuf> {
    let trimmed = target.trim();
    let candidate = if trimmed.ends_with(".tex") {
        PathBuf::from(trimmed)
    } else {
        PathBuf::from(format!("{}.tex", trimmed))
    };

    let from_current = current_file
        .parent()
        .map(|dir| dir.join(&candidate))
        .filter(|p| p.is_file());
    if let Some(path) = from_current {
        return path.canonicalize().ok();
    }

    let from_root = root.join(&candidate);
    if from_root.is_file() {
        return from_root.canonicalize().ok();
    }

    None
}

/// Walk the inclusion graph starting at `entry`.
///
/// Inclusion edges impose discovery order only; units can later be
/// translated in any order or concurrently.
pub fn discover(root: &Path, entry: &Path) -> Result<DiscoveredGraph> {
    let entry = entry
        .canonicalize()
        .map_err(|e| anyhow!("Cannot canonicalize entry file {}: {}", entry.display(), e))?;
    // Canonicalize the root as well so relative paths stay stable when
    // the sandbox sits behind a symlink (macOS /tmp).
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let mut walk = Walk {
        root: &root,
        entry: entry.clone(),
        units: Vec::new(),
        warnings: Vec::new(),
        visited: HashSet::new(),
        ancestors: HashSet::new(),
    };
    walk.visit(entry);

    info!(
        "Discovered {} translation units ({} warnings)",
        walk.units.len(),
        walk.warnings.len()
    );

    Ok(DiscoveredGraph {
        units: walk.units,
        warnings: walk.warnings,
    })
}

/// Mutable state of one discovery traversal
struct Walk<'a> {
    root: &'a Path,
    entry: PathBuf,
    units: Vec<TranslationUnit>,
    warnings: Vec<DiscoveryWarning>,
    visited: HashSet<PathBuf>,
    // Files on the current DFS path; a revisit here is a real cycle,
    // a revisit elsewhere is a diamond and stays silent.
    ancestors: HashSet<PathBuf>,
}

impl Walk<'_> {
    fn visit(&mut self, path: PathBuf) {
        if self.visited.contains(&path) {
            if self.ancestors.contains(&path) {
                debug!("Inclusion cycle at {}, truncating", path.display());
                self.warnings.push(DiscoveryWarning::CycleTruncated { at: path });
            } else {
                debug!("Diamond inclusion of {}, already discovered", path.display());
            }
            return;
        }
        self.visited.insert(path.clone());

        let content = match FileManager::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read discovered unit {}: {}", path.display(), e);
                return;
            }
        };

        let relative = path.strip_prefix(self.root).unwrap_or(&path).to_path_buf();
        let mut unit = TranslationUnit::new(path.clone(), relative, content);
        unit.is_entry = path == self.entry;

        let mut children = Vec::new();
        for caps in INCLUDE_REGEX.captures_iter(&unit.content) {
            let target = caps[1].to_string();
            match resolve_include(self.root, &path, &target) {
                Some(resolved) => {
                    unit.includes.push(resolved.clone());
                    children.push(resolved);
                }
                None => {
                    warn!("Unresolved include '{}' in {}", target, unit.name());
                    self.warnings.push(DiscoveryWarning::MissingInclude {
                        from: path.clone(),
                        target,
                    });
                }
            }
        }
        self.units.push(unit);

        self.ancestors.insert(path.clone());
        for child in children {
            self.visit(child);
        }
        self.ancestors.remove(&path);
    }
}
