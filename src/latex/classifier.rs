/*!
 * Span classification for LaTeX buffers.
 *
 * The classifier splits raw LaTeX text into an ordered, non-overlapping
 * sequence of spans that covers the whole buffer. Each span is either
 * PROTECTED (math, citations, labels, verbatim, comments - content that
 * must survive translation byte-for-byte) or TRANSLATABLE (prose).
 *
 * Classification runs in two passes:
 *
 * 1. A grammar-aware pass that walks the buffer and recognizes math
 *    delimiters, environments with known argument shapes, and macros
 *    whose arguments must not be translated.
 * 2. A regex fallback pass over the remaining translatable gaps that
 *    catches constructs the structural pass does not model (`\verb`,
 *    exotic citation variants).
 *
 * Malformed input never aborts classification: an unterminated construct
 * is classified PROTECTED up to end-of-buffer and the classification is
 * flagged as degraded.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

/// Environments masked as a single opaque block, wrapper included
const OPAQUE_ENVIRONMENTS: &[&str] = &[
    "equation",
    "align",
    "alignat",
    "gather",
    "multline",
    "eqnarray",
    "math",
    "displaymath",
    "tabular",
    "array",
    "tikzpicture",
    "algorithmic",
    "algorithm",
];

/// Code environments, also opaque - their bodies are never prose
const VERBATIM_ENVIRONMENTS: &[&str] = &["verbatim", "lstlisting", "minted", "Verbatim"];

/// Macros whose entire invocation (name, options, argument) is protected
const PROTECTED_MACROS: &[&str] = &[
    "cite",
    "citep",
    "citet",
    "citeauthor",
    "citeyear",
    "ref",
    "cref",
    "Cref",
    "eqref",
    "autoref",
    "pageref",
    "label",
    "input",
    "include",
    "includegraphics",
    "url",
    "bibliography",
    "bibliographystyle",
];

/// Fallback pattern for citation-family macros the grammar pass may miss
static FALLBACK_CITE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[a-zA-Z]*(?:cite|ref|label)[a-zA-Z]*\*?(?:\[[^\[\]]*\])*\{[^{}]*\}")
        .expect("Invalid fallback citation regex")
});

/// Fallback pattern for display math the grammar pass may have skipped
static FALLBACK_DISPLAY_MATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$.*?\$\$").expect("Invalid fallback display math regex"));

/// What kind of protected content a span holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedKind {
    /// Inline math: `$...$` or `\(...\)`
    InlineMath,
    /// Display math: `$$...$$`, `\[...\]` or a math environment
    DisplayMath,
    /// An opaque environment, wrapper included
    Environment(String),
    /// A verbatim or listing environment
    Verbatim(String),
    /// A protected macro invocation such as `\cite{...}`
    Macro(String),
    /// A `%` comment to end of line
    Comment,
}

impl ProtectedKind {
    /// Short uppercase tag used to build placeholder tokens
    pub fn tag(&self) -> &'static str {
        match self {
            Self::InlineMath => "MATH",
            Self::DisplayMath => "DMATH",
            Self::Environment(_) => "ENV",
            Self::Verbatim(_) => "VERB",
            Self::Macro(_) => "CMD",
            Self::Comment => "CMT",
        }
    }
}

/// Classification of a single span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    /// Prose that the translator may rewrite
    Translatable,
    /// Content that must survive byte-for-byte
    Protected(ProtectedKind),
}

/// A classified region of the buffer, in byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first byte of the span
    pub start: usize,
    /// Byte offset one past the last byte of the span
    pub end: usize,
    /// Classification of the span
    pub kind: SpanKind,
}

impl Span {
    /// Slice the original buffer for this span
    pub fn text<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.start..self.end]
    }
}

/// Result of classifying a buffer
#[derive(Debug, Clone)]
pub struct Classification {
    /// Ordered, non-overlapping spans covering the whole buffer
    pub spans: Vec<Span>,
    /// True when an unterminated construct forced protection to end-of-buffer
    pub degraded: bool,
}

impl Classification {
    /// Iterate only the protected spans
    pub fn protected(&self) -> impl Iterator<Item = &Span> {
        self.spans
            .iter()
            .filter(|s| matches!(s.kind, SpanKind::Protected(_)))
    }
}

/// Classify a LaTeX buffer into protected and translatable spans.
///
/// The returned spans are sorted, non-overlapping and cover the buffer
/// completely. This function never fails: malformed input degrades the
/// classification instead of aborting.
pub fn classify(text: &str) -> Classification {
    let mut scanner = GrammarScanner::new(text);
    scanner.run();

    let mut protected = scanner.protected;
    let degraded = scanner.degraded;

    // Fallback pass: only the gaps the grammar pass left translatable
    // are rescanned, so spans already protected are never reclassified.
    let extra = fallback_pass(text, &protected);
    protected.extend(extra);
    protected.sort_by_key(|(start, _, _)| *start);

    let spans = fill_gaps(text.len(), protected);

    if degraded {
        warn!("Classification degraded: unterminated construct protected to end of buffer");
    }
    debug!(
        "Classified {} spans ({} protected)",
        spans.len(),
        spans
            .iter()
            .filter(|s| matches!(s.kind, SpanKind::Protected(_)))
            .count()
    );

    Classification { spans, degraded }
}

/// Regex fallback over translatable gaps
fn fallback_pass(
    text: &str,
    protected: &[(usize, usize, ProtectedKind)],
) -> Vec<(usize, usize, ProtectedKind)> {
    let mut extra = Vec::new();

    let mut gaps = Vec::new();
    let mut cursor = 0usize;
    for (start, end, _) in protected {
        if *start > cursor {
            gaps.push((cursor, *start));
        }
        cursor = cursor.max(*end);
    }
    if cursor < text.len() {
        gaps.push((cursor, text.len()));
    }

    for (gap_start, gap_end) in gaps {
        let gap = &text[gap_start..gap_end];

        for m in FALLBACK_DISPLAY_MATH_REGEX.find_iter(gap) {
            extra.push((
                gap_start + m.start(),
                gap_start + m.end(),
                ProtectedKind::DisplayMath,
            ));
        }
        for m in FALLBACK_CITE_REGEX.find_iter(gap) {
            let range = (gap_start + m.start(), gap_start + m.end());
            if !overlaps(&extra, range) {
                extra.push((range.0, range.1, ProtectedKind::Macro("cite".to_string())));
            }
        }
        // \verb|...| with an arbitrary delimiter character
        let mut offset = 0;
        while let Some(found) = gap[offset..].find("\\verb") {
            let abs = offset + found;
            let after = abs + "\\verb".len();
            let rest = &gap[after..];
            let mut chars = rest.char_indices();
            match chars.next() {
                Some((_, delim)) if !delim.is_alphabetic() && delim != '*' => {
                    let delim_len = delim.len_utf8();
                    if let Some(close) = rest[delim_len..].find(delim) {
                        let end = after + delim_len + close + delim.len_utf8();
                        let range = (gap_start + abs, gap_start + end);
                        if !overlaps(&extra, range) {
                            extra.push((
                                range.0,
                                range.1,
                                ProtectedKind::Verbatim("verb".to_string()),
                            ));
                        }
                        offset = end;
                        continue;
                    }
                }
                _ => {}
            }
            offset = after;
        }
    }

    extra
}

fn overlaps(ranges: &[(usize, usize, ProtectedKind)], candidate: (usize, usize)) -> bool {
    ranges
        .iter()
        .any(|(s, e, _)| candidate.0 < *e && *s < candidate.1)
}

/// Fill the gaps between protected ranges with translatable spans
fn fill_gaps(len: usize, protected: Vec<(usize, usize, ProtectedKind)>) -> Vec<Span> {
    let mut spans = Vec::with_capacity(protected.len() * 2 + 1);
    let mut cursor = 0usize;

    for (start, end, kind) in protected {
        // Overlapping ranges cannot arise from the two-pass scheme, but a
        // stale range after a degraded protect-to-end still gets dropped.
        if start < cursor {
            continue;
        }
        if start > cursor {
            spans.push(Span {
                start: cursor,
                end: start,
                kind: SpanKind::Translatable,
            });
        }
        spans.push(Span {
            start,
            end,
            kind: SpanKind::Protected(kind),
        });
        cursor = end;
    }
    if cursor < len {
        spans.push(Span {
            start: cursor,
            end: len,
            kind: SpanKind::Translatable,
        });
    }

    spans
}

/// Structure-aware scanner over a LaTeX buffer
struct GrammarScanner<'a> {
    text: &'a str,
    protected: Vec<(usize, usize, ProtectedKind)>,
    degraded: bool,
}

impl<'a> GrammarScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            protected: Vec::new(),
            degraded: false,
        }
    }

    fn run(&mut self) {
        let bytes = self.text.as_bytes();
        let mut pos = 0usize;

        while pos < bytes.len() {
            match bytes[pos] {
                b'\\' => pos = self.scan_backslash(pos),
                b'$' => pos = self.scan_dollar(pos),
                b'%' => pos = self.scan_comment(pos),
                _ => pos += utf8_len(bytes[pos]),
            }
        }
    }

    /// Protect a range and flag degradation when it ran to end-of-buffer
    /// because of a missing terminator.
    fn protect(&mut self, start: usize, end: usize, kind: ProtectedKind) {
        self.protected.push((start, end, kind));
    }

    fn degrade(&mut self, start: usize, kind: ProtectedKind, what: &str) -> usize {
        warn!(
            "Unterminated {} at byte {}; protecting to end of buffer",
            what, start
        );
        self.degraded = true;
        self.protect(start, self.text.len(), kind);
        self.text.len()
    }

    /// Handle a backslash: macro, environment, display/inline math
    /// delimiters, or an escaped character.
    fn scan_backslash(&mut self, start: usize) -> usize {
        let rest = &self.text[start + 1..];
        let mut chars = rest.chars();

        match chars.next() {
            None => start + 1,
            Some('[') => match find_unescaped(self.text, start + 2, "\\]") {
                Some(close) => {
                    self.protect(start, close + 2, ProtectedKind::DisplayMath);
                    close + 2
                }
                None => self.degrade(start, ProtectedKind::DisplayMath, "display math"),
            },
            Some('(') => match find_unescaped(self.text, start + 2, "\\)") {
                Some(close) => {
                    self.protect(start, close + 2, ProtectedKind::InlineMath);
                    close + 2
                }
                None => self.degrade(start, ProtectedKind::InlineMath, "inline math"),
            },
            Some(c) if c.is_ascii_alphabetic() => {
                let name_len = rest
                    .find(|ch: char| !ch.is_ascii_alphabetic())
                    .unwrap_or(rest.len());
                let name = &rest[..name_len];
                let after_name = start + 1 + name_len;

                if name == "begin" {
                    self.scan_environment(start, after_name)
                } else if PROTECTED_MACROS.contains(&name) {
                    self.scan_protected_macro(start, after_name, name)
                } else {
                    // Transparent macro (\section, \textbf, ...): the
                    // command token stays translatable text, its brace
                    // arguments are prose and get scanned normally.
                    after_name
                }
            }
            // Escaped character (\$, \%, \{, \\ ...) - skip both bytes
            Some(c) => start + 1 + c.len_utf8(),
        }
    }

    /// Protect `\name[...]...{...}` covering star, options, and one
    /// mandatory argument group.
    fn scan_protected_macro(&mut self, start: usize, after_name: usize, name: &str) -> usize {
        let mut pos = after_name;
        let bytes = self.text.as_bytes();

        if pos < bytes.len() && bytes[pos] == b'*' {
            pos += 1;
        }
        pos = skip_spaces(self.text, pos);
        while pos < bytes.len() && bytes[pos] == b'[' {
            match self.text[pos..].find(']') {
                Some(close) => pos = pos + close + 1,
                None => return self.degrade(start, ProtectedKind::Macro(name.to_string()), "macro options"),
            }
            pos = skip_spaces(self.text, pos);
        }

        if pos < bytes.len() && bytes[pos] == b'{' {
            match find_balanced_group(self.text, pos) {
                Some(end) => {
                    self.protect(start, end, ProtectedKind::Macro(name.to_string()));
                    end
                }
                None => self.degrade(start, ProtectedKind::Macro(name.to_string()), "macro argument"),
            }
        } else {
            // Bare protected macro without an argument (\bibliography
            // misuse etc.) - protect just the command token.
            self.protect(start, after_name, ProtectedKind::Macro(name.to_string()));
            after_name
        }
    }

    /// Handle `\begin{env}` for opaque and verbatim environments.
    /// Transparent environments fall through: scanning continues inside.
    fn scan_environment(&mut self, start: usize, after_begin: usize) -> usize {
        let pos = skip_spaces(self.text, after_begin);
        let bytes = self.text.as_bytes();
        if pos >= bytes.len() || bytes[pos] != b'{' {
            return after_begin;
        }
        let name_end = match self.text[pos..].find('}') {
            Some(close) => pos + close,
            None => return after_begin,
        };
        let env = &self.text[pos + 1..name_end];
        let body_start = name_end + 1;

        let base = env.trim_end_matches('*');
        if VERBATIM_ENVIRONMENTS.contains(&base) {
            // Verbatim bodies may contain anything, including \begin
            // tokens - only the literal \end{env} terminates them.
            let terminator = format!("\\end{{{}}}", env);
            match self.text[body_start..].find(&terminator) {
                Some(found) => {
                    let end = body_start + found + terminator.len();
                    self.protect(start, end, ProtectedKind::Verbatim(env.to_string()));
                    end
                }
                None => self.degrade(
                    start,
                    ProtectedKind::Verbatim(env.to_string()),
                    "verbatim environment",
                ),
            }
        } else if OPAQUE_ENVIRONMENTS.contains(&base) {
            match self.find_environment_end(env, body_start) {
                Some(end) => {
                    self.protect(start, end, ProtectedKind::Environment(env.to_string()));
                    end
                }
                None => self.degrade(
                    start,
                    ProtectedKind::Environment(env.to_string()),
                    "environment",
                ),
            }
        } else {
            // Transparent environment (figure, itemize, center, ...):
            // recurse by simply continuing the scan after the opener.
            body_start
        }
    }

    /// Find the end of `\end{env}` matching a `\begin{env}`, honoring
    /// same-name nesting.
    fn find_environment_end(&self, env: &str, from: usize) -> Option<usize> {
        let open = format!("\\begin{{{}}}", env);
        let close = format!("\\end{{{}}}", env);
        let mut depth = 1usize;
        let mut pos = from;

        while pos < self.text.len() {
            let next_open = self.text[pos..].find(&open);
            let next_close = self.text[pos..].find(&close)?;

            match next_open {
                Some(o) if o < next_close => {
                    depth += 1;
                    pos = pos + o + open.len();
                }
                _ => {
                    depth -= 1;
                    let end = pos + next_close + close.len();
                    if depth == 0 {
                        return Some(end);
                    }
                    pos = end;
                }
            }
        }
        None
    }

    /// Handle `$...$` and `$$...$$`
    fn scan_dollar(&mut self, start: usize) -> usize {
        let bytes = self.text.as_bytes();
        let display = start + 1 < bytes.len() && bytes[start + 1] == b'$';

        if display {
            match find_unescaped(self.text, start + 2, "$$") {
                Some(close) => {
                    self.protect(start, close + 2, ProtectedKind::DisplayMath);
                    close + 2
                }
                None => self.degrade(start, ProtectedKind::DisplayMath, "display math"),
            }
        } else {
            match find_unescaped(self.text, start + 1, "$") {
                Some(close) => {
                    self.protect(start, close + 1, ProtectedKind::InlineMath);
                    close + 1
                }
                None => self.degrade(start, ProtectedKind::InlineMath, "inline math"),
            }
        }
    }

    /// Handle `%` comments to end of line (newline excluded)
    fn scan_comment(&mut self, start: usize) -> usize {
        let end = self.text[start..]
            .find('\n')
            .map(|n| start + n)
            .unwrap_or(self.text.len());
        self.protect(start, end, ProtectedKind::Comment);
        end
    }
}

/// Find `needle` at or after `from`, skipping occurrences preceded by a
/// backslash.
fn find_unescaped(text: &str, from: usize, needle: &str) -> Option<usize> {
    let mut pos = from;
    while let Some(found) = text[pos..].find(needle) {
        let abs = pos + found;
        if abs > 0 && text.as_bytes()[abs - 1] == b'\\' {
            pos = abs + needle.len();
            continue;
        }
        return Some(abs);
    }
    None
}

/// End offset (exclusive) of a balanced `{...}` group starting at `open`,
/// honoring escaped braces.
fn find_balanced_group(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes[open], b'{');
    let mut depth = 0i32;
    let mut pos = open;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'{' => {
                depth += 1;
                pos += 1;
            }
            b'}' => {
                depth -= 1;
                pos += 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            b => pos += utf8_len(b),
        }
    }
    None
}

fn skip_spaces(text: &str, mut pos: usize) -> usize {
    let bytes = text.as_bytes();
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }
    pos
}

/// Length in bytes of the UTF-8 sequence starting with this byte
fn utf8_len(byte: u8) -> usize {
    match byte {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        b if b >= 0xC0 => 2,
        _ => 1,
    }
}
