/*!
 * Conservative structural balance checking.
 *
 * Compares the translated masked text against the source masked text on
 * two structural measures the translator must not disturb:
 *
 * - the net brace delta (opens minus closes, escaped braces and
 *   placeholder contents excluded)
 * - the per-name counts of `\begin{...}` / `\end{...}` appearing in
 *   translatable text
 *
 * Deltas are compared rather than demanding zero: a chunk may
 * legitimately open a group that a later chunk closes, and source text
 * that was unbalanced to begin with must not be "fixed" by the check.
 */

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::latex::masking::PLACEHOLDER_REGEX;

use super::Violation;

static ENV_DELIMITER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(begin|end)\s*\{([^{}]+)\}").expect("Invalid environment delimiter regex")
});

/// Compare the structural balance of source and translated masked text.
/// Returns every violation found.
pub fn check(source_masked: &str, translated_masked: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    let expected = brace_delta(source_masked);
    let found = brace_delta(translated_masked);
    if expected != found {
        violations.push(Violation::UnbalancedBraces { expected, found });
    }

    let source_envs = environment_counts(source_masked);
    let translated_envs = environment_counts(translated_masked);

    for (name, (src_begin, src_end)) in &source_envs {
        let (tr_begin, tr_end) = translated_envs.get(name).copied().unwrap_or((0, 0));
        if (src_begin, src_end) != (&tr_begin, &tr_end) {
            violations.push(Violation::UnbalancedEnvironment {
                name: name.clone(),
                detail: format!(
                    "source has {} begin / {} end, translation has {} / {}",
                    src_begin, src_end, tr_begin, tr_end
                ),
            });
        }
    }
    for (name, (tr_begin, tr_end)) in &translated_envs {
        if !source_envs.contains_key(name) {
            violations.push(Violation::UnbalancedEnvironment {
                name: name.clone(),
                detail: format!(
                    "translation introduced {} begin / {} end",
                    tr_begin, tr_end
                ),
            });
        }
    }

    violations
}

/// Net brace delta of text, ignoring escaped braces and placeholder
/// tokens.
fn brace_delta(text: &str) -> i64 {
    let stripped = PLACEHOLDER_REGEX.replace_all(text, "");
    let bytes = stripped.as_bytes();
    let mut delta = 0i64;
    let mut pos = 0usize;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'{' => {
                delta += 1;
                pos += 1;
            }
            b'}' => {
                delta -= 1;
                pos += 1;
            }
            _ => pos += 1,
        }
    }

    delta
}

/// Per-environment (begin, end) counts in text with placeholders removed
fn environment_counts(text: &str) -> BTreeMap<String, (usize, usize)> {
    let stripped = PLACEHOLDER_REGEX.replace_all(text, "");
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for caps in ENV_DELIMITER_REGEX.captures_iter(&stripped) {
        let entry = counts.entry(caps[2].to_string()).or_insert((0, 0));
        match &caps[1] {
            "begin" => entry.0 += 1,
            _ => entry.1 += 1,
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::ViolationClass;

    #[test]
    fn test_check_withPreservedStructure_shouldPass() {
        let source = "\\section{Intro} prose {grouped} text";
        let translated = "\\section{Einleitung} Prosa {gruppiert} Text";

        assert!(check(source, translated).is_empty());
    }

    #[test]
    fn test_check_withDroppedClosingBrace_shouldReportDelta() {
        let source = "\\textbf{bold} text";
        let translated = "\\textbf{fett text";

        let violations = check(source, translated);
        assert_eq!(
            violations,
            vec![Violation::UnbalancedBraces {
                expected: 0,
                found: 1
            }]
        );
    }

    #[test]
    fn test_check_withEscapedBraces_shouldIgnoreThem() {
        let source = "a \\{ literal \\} pair";
        let translated = "ein \\{ literales \\} Paar";

        assert!(check(source, translated).is_empty());
    }

    #[test]
    fn test_check_withDroppedEnvironmentEnd_shouldReportPairing() {
        let source = "\\begin{itemize} \\item a \\end{itemize}";
        let translated = "\\begin{itemize} \\item a";

        let violations = check(source, translated);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].class(),
            ViolationClass::UnbalancedEnvironment
        );
    }

    #[test]
    fn test_check_withIntroducedEnvironment_shouldReportIt() {
        let source = "plain prose";
        let translated = "\\begin{center}prose\\end{center}";

        let violations = check(source, translated);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_check_withUnbalancedSource_shouldAcceptMatchingDelta() {
        // Source itself carries an open group; the translation keeps it
        let source = "opening {group across chunk";
        let translated = "ouverture {groupe en travers";

        assert!(check(source, translated).is_empty());
    }
}
