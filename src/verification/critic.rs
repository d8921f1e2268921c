/*!
 * The Reflexion critic.
 *
 * A pure structural verifier over translated-but-still-masked text. The
 * mask table is the ground truth; the critic never consults the
 * translator or any external state, so identical inputs always produce
 * identical verdicts.
 */

use log::debug;

use crate::latex::masking::MaskTable;

use super::{balance, placeholders, Verdict};

/// Structural/integrity verifier for translated masked text
pub struct ReflexionCritic;

impl ReflexionCritic {
    /// Review a translation attempt against its mask table and source.
    ///
    /// Checks placeholder-set conservation first, then structural
    /// balance, and enumerates every violation found in both checks.
    pub fn review(table: &MaskTable, source_masked: &str, translated_masked: &str) -> Verdict {
        let mut violations = placeholders::check(table, translated_masked);
        violations.extend(balance::check(source_masked, translated_masked));

        if !violations.is_empty() {
            debug!("Critic found {} violations", violations.len());
        }

        Verdict { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::masking::MaskEngine;

    #[test]
    fn test_review_withFaithfulTranslation_shouldPass() {
        let masked = MaskEngine::mask("The result $r$ follows from \\cite{key}.");
        let translated = masked
            .text
            .replace("The result", "Das Ergebnis")
            .replace("follows from", "folgt aus");

        let verdict = ReflexionCritic::review(&masked.table, &masked.text, &translated);
        assert!(verdict.passed());
    }

    #[test]
    fn test_review_withMultipleDefects_shouldListEveryViolation() {
        let masked = MaskEngine::mask("First $a$ then \\cite{b}.");
        let tokens: Vec<String> = masked.table.tokens().map(String::from).collect();
        // Drop one placeholder and break a brace in one shot
        let translated = masked.text.replace(&tokens[1], "{oops");

        let verdict = ReflexionCritic::review(&masked.table, &masked.text, &translated);
        assert!(!verdict.passed());
        assert!(verdict.violations.len() >= 2);
    }

    #[test]
    fn test_review_isDeterministic() {
        let masked = MaskEngine::mask("Some $m$ text.");
        let translated = masked.text.replace("text", "Text {");

        let first = ReflexionCritic::review(&masked.table, &masked.text, &translated);
        let second = ReflexionCritic::review(&masked.table, &masked.text, &translated);

        assert_eq!(first.violations, second.violations);
        assert_eq!(first.summary(), second.summary());
    }
}
