/*!
 * Reversible masking of protected LaTeX spans.
 *
 * The masking engine replaces every protected span with a short
 * placeholder token and keeps an ordered table mapping each token back
 * to its original text. Tokens are built from a reserved alphabet
 * (U+27E6 / U+27E7 white square brackets around an uppercase kind tag
 * and a zero-padded counter, e.g. `⟦MATH:0007⟧`) that cannot occur in
 * prose or LaTeX command names, so a translator cannot produce one by
 * accident. The counter is monotonic within a buffer - byte-identical
 * spans still get distinct tokens.
 *
 * Round-trip law: for any input text, `unmask(mask(text))` returns the
 * input byte-for-byte.
 */

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::MaskingError;
use crate::latex::classifier::{self, SpanKind};

/// Opening delimiter of a placeholder token
pub const PLACEHOLDER_OPEN: char = '\u{27E6}';
/// Closing delimiter of a placeholder token
pub const PLACEHOLDER_CLOSE: char = '\u{27E7}';

/// Pattern matching any well-formed placeholder token
pub static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\u{27E6}[A-Z]+:[0-9]{4}\u{27E7}").expect("Invalid placeholder regex"));

/// One masked span: the token standing in for it and the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskEntry {
    /// The placeholder token, e.g. `⟦CMD:0002⟧`
    pub token: String,
    /// The original span text, restored verbatim on unmask
    pub original: String,
}

/// Ordered mapping from placeholder tokens to original spans.
///
/// Entries are stored in document order. Every token appears exactly
/// once as a key; the monotonic counter makes collisions impossible
/// even for byte-identical spans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaskTable {
    entries: Vec<MaskEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl MaskTable {
    fn push(&mut self, token: String, original: String) {
        self.index.insert(token.clone(), self.entries.len());
        self.entries.push(MaskEntry { token, original });
    }

    /// Look up the original text for a token
    pub fn get(&self, token: &str) -> Option<&str> {
        // The index is skipped by serde; fall back to a scan for tables
        // loaded from an audit dump.
        if self.index.is_empty() && !self.entries.is_empty() {
            return self
                .entries
                .iter()
                .find(|e| e.token == token)
                .map(|e| e.original.as_str());
        }
        self.index
            .get(token)
            .map(|i| self.entries[*i].original.as_str())
    }

    /// Whether the table contains a token
    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Entries in document order
    pub fn entries(&self) -> &[MaskEntry] {
        &self.entries
    }

    /// All tokens in document order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.token.as_str())
    }

    /// Number of masked spans
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Restrict the table to the entries whose tokens occur in `text`.
    ///
    /// Used to verify a single chunk against only the placeholders its
    /// source chunk carries.
    pub fn subset_for(&self, text: &str) -> MaskTable {
        let mut subset = MaskTable::default();
        for entry in &self.entries {
            if text.contains(&entry.token) {
                subset.push(entry.token.clone(), entry.original.clone());
            }
        }
        subset
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A buffer with its protected spans masked out
#[derive(Debug, Clone)]
pub struct MaskedBuffer {
    /// Text with placeholders substituted for protected spans
    pub text: String,
    /// The placeholder-to-original mapping
    pub table: MaskTable,
    /// Whether the classification behind this mask was degraded
    pub degraded: bool,
}

/// The masking engine: `mask` and its exact inverse `unmask`
pub struct MaskEngine;

impl MaskEngine {
    /// Mask every protected span in `text`.
    ///
    /// Translatable spans pass through untouched. Placeholder tokens are
    /// unique within the returned buffer.
    pub fn mask(text: &str) -> MaskedBuffer {
        let classification = classifier::classify(text);

        let mut masked = String::with_capacity(text.len());
        let mut table = MaskTable::default();
        let mut counter = 0usize;

        for span in &classification.spans {
            match &span.kind {
                SpanKind::Translatable => masked.push_str(span.text(text)),
                SpanKind::Protected(kind) => {
                    let token = format!(
                        "{}{}:{:04}{}",
                        PLACEHOLDER_OPEN,
                        kind.tag(),
                        counter,
                        PLACEHOLDER_CLOSE
                    );
                    counter += 1;
                    masked.push_str(&token);
                    table.push(token, span.text(text).to_string());
                }
            }
        }

        debug!(
            "Masked {} spans out of {} byte buffer",
            table.len(),
            text.len()
        );

        MaskedBuffer {
            text: masked,
            table,
            degraded: classification.degraded,
        }
    }

    /// Restore every placeholder in `masked` from `table`.
    ///
    /// Fails with [`MaskingError::UnknownPlaceholder`] when the text
    /// references a token missing from the table, and with
    /// [`MaskingError::UnreferencedEntry`] when a table entry is never
    /// referenced - both indicate externally introduced corruption and
    /// are surfaced, never dropped.
    pub fn unmask(masked: &str, table: &MaskTable) -> Result<String, MaskingError> {
        let mut output = String::with_capacity(masked.len());
        let mut referenced = vec![false; table.len()];
        let mut cursor = 0usize;

        for found in PLACEHOLDER_REGEX.find_iter(masked) {
            output.push_str(&masked[cursor..found.start()]);
            let token = found.as_str();

            match table.entries.iter().position(|e| e.token == token) {
                Some(idx) => {
                    referenced[idx] = true;
                    output.push_str(&table.entries[idx].original);
                }
                None => {
                    return Err(MaskingError::UnknownPlaceholder(token.to_string()));
                }
            }
            cursor = found.end();
        }
        output.push_str(&masked[cursor..]);

        if let Some(idx) = referenced.iter().position(|r| !r) {
            return Err(MaskingError::UnreferencedEntry(
                table.entries[idx].token.clone(),
            ));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_withProtectedSpans_shouldSubstitutePlaceholders() {
        let text = "The value $x=1$ from \\cite{foo} holds.";
        let masked = MaskEngine::mask(text);

        assert_eq!(masked.table.len(), 2);
        assert!(!masked.text.contains("$x=1$"));
        assert!(!masked.text.contains("\\cite{foo}"));
        assert!(masked.text.contains("The value "));
        assert_eq!(PLACEHOLDER_REGEX.find_iter(&masked.text).count(), 2);
    }

    #[test]
    fn test_maskUnmask_roundTrip_shouldBeByteIdentical() {
        let samples = [
            "Plain prose without structure.",
            "Math $a+b$ and $$c$$ mixed with \\ref{sec:x}.",
            "\\begin{equation}\n  e^{i\\pi} = -1\n\\end{equation}\ntrailing",
            "Unicode grüße $\\delta$ 数学 % comment\nend",
            "",
            "  \n\n  whitespace\texactly  preserved \n",
        ];

        for text in samples {
            let masked = MaskEngine::mask(text);
            let restored = MaskEngine::unmask(&masked.text, &masked.table).unwrap();
            assert_eq!(restored, text, "round trip failed for {:?}", text);
        }
    }

    #[test]
    fn test_mask_withIdenticalSpans_shouldAssignDistinctTokens() {
        let text = "$x$ and $x$ and $x$";
        let masked = MaskEngine::mask(text);

        assert_eq!(masked.table.len(), 3);
        let tokens: Vec<&str> = masked.table.tokens().collect();
        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_mask_onAlreadyMaskedText_shouldFindNothingNew() {
        let text = "Equation $y=2$ cited as \\cite{bar}.";
        let first = MaskEngine::mask(text);
        let second = MaskEngine::mask(&first.text);

        // Placeholders are never themselves reclassified as protectable
        assert!(second.table.is_empty());
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn test_unmask_withUnknownPlaceholder_shouldError() {
        let masked = MaskEngine::mask("Value $v$ here.");
        let corrupted = format!("{} {}EXTRA:9999{}", masked.text, PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE);

        let err = MaskEngine::unmask(&corrupted, &masked.table).unwrap_err();
        assert!(matches!(err, MaskingError::UnknownPlaceholder(_)));
    }

    #[test]
    fn test_unmask_withDroppedPlaceholder_shouldError() {
        let masked = MaskEngine::mask("Value $v$ here.");
        let token = masked.table.tokens().next().unwrap().to_string();
        let corrupted = masked.text.replace(&token, "");

        let err = MaskEngine::unmask(&corrupted, &masked.table).unwrap_err();
        assert_eq!(err, MaskingError::UnreferencedEntry(token));
    }

    #[test]
    fn test_mask_withDegradedClassification_shouldStillRoundTrip() {
        let text = "Broken $math that never closes";
        let masked = MaskEngine::mask(text);

        assert!(masked.degraded);
        let restored = MaskEngine::unmask(&masked.text, &masked.table).unwrap();
        assert_eq!(restored, text);
    }

    #[test]
    fn test_maskTable_serialization_shouldSurviveAuditDump() {
        let masked = MaskEngine::mask("See \\cite{a} and $b$.");
        let json = serde_json::to_string(&masked.table).unwrap();
        let reloaded: MaskTable = serde_json::from_str(&json).unwrap();

        assert_eq!(reloaded.len(), masked.table.len());
        for entry in masked.table.entries() {
            assert_eq!(reloaded.get(&entry.token), Some(entry.original.as_str()));
        }
    }
}
