/*!
 * PDF compilation of the translated source tree.
 *
 * Three concerns live here, all consumed by the controller after the
 * translation phase:
 *
 * - `sanitize_preamble`: a pure transform that comments out font
 *   packages and `\pdfoutput` assignments that break xelatex builds
 * - `inject_cjk_fonts`: inserts an xeCJK block after `\documentclass`
 *   when the target language needs CJK fonts
 * - `CompileService`: runs latexmk in the sandbox with a timeout
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;

use crate::file_utils::FileManager;

/// Marker prepended to lines the sanitizer comments out
const SANITIZED_MARKER: &str = "% LATRANS_SANITIZED: ";

/// Font and encoding packages that conflict with xeCJK/xelatex
const CONFLICTING_PACKAGES: &[&str] = &[
    "times",
    "palatino",
    "mathptmx",
    "newtxtext",
    "newtxmath",
    "helvet",
    "avant",
    "courier",
    "chancery",
    "bookman",
    "newcent",
    "charter",
    "fourier",
];

static PDFOUTPUT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)(\\pdfoutput\s*=\s*\d+)").expect("Invalid pdfoutput regex")
});

static FONTENC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)(\\usepackage\s*\[T1\]\s*\{fontenc\}.*)$")
        .expect("Invalid fontenc regex")
});

static INPUTENC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)(\\usepackage\s*\[utf8\]\s*\{inputenc\}.*)$")
        .expect("Invalid inputenc regex")
});

static DOCUMENTCLASS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\documentclass(\[.*?\])?\{.*?\}").expect("Invalid documentclass regex")
});

/// Comment out preamble lines that conflict with the xelatex toolchain.
///
/// Pure transform: same input, same output, no IO. Lines already
/// sanitized are left alone.
pub fn sanitize_preamble(content: &str) -> String {
    let mut sanitized = PDFOUTPUT_REGEX
        .replace_all(content, format!("$1{}$2", SANITIZED_MARKER))
        .into_owned();
    sanitized = FONTENC_REGEX
        .replace_all(&sanitized, format!("$1{}$2", SANITIZED_MARKER))
        .into_owned();
    sanitized = INPUTENC_REGEX
        .replace_all(&sanitized, format!("$1{}$2", SANITIZED_MARKER))
        .into_owned();

    for package in CONFLICTING_PACKAGES {
        let pattern = format!(
            r"(?m)^([ \t]*)(\\usepackage\s*(\[[^\]]*\])?\s*\{{{}\}}.*)$",
            regex::escape(package)
        );
        // Built per package; the package list is small and fixed
        let re = Regex::new(&pattern).expect("Invalid package regex");
        sanitized = re
            .replace_all(&sanitized, format!("$1{}$2", SANITIZED_MARKER))
            .into_owned();
    }

    sanitized
}

/// Sanitize every .tex/.sty/.cls file under `root` in place
pub fn sanitize_project(root: &Path) -> Result<usize> {
    let mut changed = 0usize;

    for extension in ["tex", "sty", "cls"] {
        for path in FileManager::find_files(root, extension)? {
            let content = FileManager::read_to_string(&path)?;
            let sanitized = sanitize_preamble(&content);
            if sanitized != content {
                FileManager::write_to_file(&path, &sanitized)?;
                debug!("Sanitized {}", path.display());
                changed += 1;
            }
        }
    }

    info!("Sanitized {} files under {}", changed, root.display());
    Ok(changed)
}

/// Whether the target language needs CJK font support
pub fn needs_cjk_fonts(target_language: &str) -> bool {
    matches!(
        target_language.to_lowercase().as_str(),
        "zh" | "zho" | "chi" | "ja" | "jpn" | "ko" | "kor"
    )
}

/// xeCJK preamble block injected after `\documentclass`
fn cjk_font_block() -> &'static str {
    if cfg!(target_os = "macos") {
        "\n% --- latrans font injection (macOS) ---\n\
         \\usepackage{xeCJK}\n\
         \\setCJKmainfont[BoldFont=Songti SC Bold, ItalicFont=Songti SC Light]{Songti SC}\n\
         \\setCJKsansfont{Heiti SC}\n\
         \\setCJKmonofont{STFangsong}\n\
         % --------------------------------------\n"
    } else {
        "\n% --- latrans font injection ---\n\
         \\usepackage{xeCJK}\n\
         \\setCJKmainfont{SimSun}\n\
         \\setCJKsansfont{SimHei}\n\
         \\setCJKmonofont{FangSong}\n\
         % ------------------------------\n"
    }
}

/// Inject CJK font setup into the entry file when the target language
/// requires it. Prepends the block when no `\documentclass` is found.
pub fn inject_cjk_fonts(entry_path: &Path, target_language: &str) -> Result<()> {
    if !needs_cjk_fonts(target_language) {
        debug!("Target language {} needs no font injection", target_language);
        return Ok(());
    }

    let content = FileManager::read_to_string(entry_path)?;
    if content.contains("\\usepackage{xeCJK}") {
        debug!("xeCJK already present in {}", entry_path.display());
        return Ok(());
    }

    let injected = match DOCUMENTCLASS_REGEX.find(&content) {
        Some(found) => {
            let mut out = String::with_capacity(content.len() + 256);
            out.push_str(&content[..found.end()]);
            out.push_str(cjk_font_block());
            out.push_str(&content[found.end()..]);
            out
        }
        None => {
            warn!(
                "No \\documentclass in {}; prepending font block",
                entry_path.display()
            );
            format!("{}{}", cjk_font_block(), content)
        }
    };

    FileManager::write_to_file(entry_path, &injected)?;
    info!("Injected CJK font setup into {}", entry_path.display());
    Ok(())
}

/// Result of a compilation run
#[derive(Debug)]
pub struct CompileOutcome {
    /// Path of the produced PDF
    pub pdf_path: PathBuf,
    /// Captured latexmk output
    pub log: String,
}

/// Runs latexmk over the completed source tree.
///
/// The core hands this service a finished tree and consumes a PDF path
/// back; latexmk's internals stay opaque.
pub struct CompileService {
    /// Compilation timeout
    timeout: Duration,
}

impl CompileService {
    /// Create a compile service with the given timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Compile the entry file inside the sandbox, returning the PDF path
    pub async fn compile(&self, sandbox: &Path, entry_path: &Path) -> Result<CompileOutcome> {
        let entry_name = entry_path
            .file_name()
            .ok_or_else(|| anyhow!("Entry path has no file name: {}", entry_path.display()))?;

        info!("Compiling {} in {}", entry_name.to_string_lossy(), sandbox.display());

        let run = Command::new("latexmk")
            .arg("-xelatex")
            .arg("-interaction=nonstopmode")
            .arg("-file-line-error")
            .arg("-halt-on-error")
            .arg(entry_name)
            .current_dir(sandbox)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| anyhow!("Compilation timed out after {:?}", self.timeout))?
            .context("Failed to spawn latexmk - is it installed?")?;

        let log = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(anyhow!(
                "latexmk failed with status {}: {}",
                output.status,
                last_lines(&log, 20)
            ));
        }

        let pdf_name = Path::new(entry_name).with_extension("pdf");
        let pdf_path = sandbox.join(pdf_name);
        if !pdf_path.is_file() {
            return Err(anyhow!(
                "latexmk reported success but {} is missing",
                pdf_path.display()
            ));
        }

        info!("Compilation successful: {}", pdf_path.display());
        Ok(CompileOutcome { pdf_path, log })
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
