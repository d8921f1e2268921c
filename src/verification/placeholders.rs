/*!
 * Placeholder conservation checking.
 *
 * Verifies that a translated masked text carries exactly the placeholder
 * set recorded in the mask table: every token present exactly once, no
 * token invented. This is the minimum property the critic must never
 * weaken - a conservation failure means content was silently dropped or
 * fabricated by the translator.
 */

use std::collections::HashMap;

use log::debug;

use crate::latex::masking::{MaskTable, PLACEHOLDER_REGEX};

use super::Violation;

/// Check placeholder-set conservation between a mask table and a
/// translated masked text. Returns every violation, not just the first.
pub fn check(table: &MaskTable, translated: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    // Count each placeholder-shaped token in the translation
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for found in PLACEHOLDER_REGEX.find_iter(translated) {
        *counts.entry(found.as_str()).or_insert(0) += 1;
    }

    // Every table token must appear exactly once
    for token in table.tokens() {
        match counts.get(token).copied().unwrap_or(0) {
            0 => violations.push(Violation::MissingPlaceholder {
                token: token.to_string(),
            }),
            1 => {}
            n => violations.push(Violation::DuplicatedPlaceholder {
                token: token.to_string(),
                count: n,
            }),
        }
    }

    // No token may exist that the table does not know
    for (token, _) in counts.iter() {
        if !table.contains(token) {
            violations.push(Violation::UnknownPlaceholder {
                token: token.to_string(),
            });
        }
    }

    debug!(
        "Placeholder conservation: {} expected, {} found, {} violations",
        table.len(),
        counts.values().sum::<usize>(),
        violations.len()
    );

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::masking::MaskEngine;
    use crate::verification::ViolationClass;

    #[test]
    fn test_check_withConservedPlaceholders_shouldPass() {
        let masked = MaskEngine::mask("Value $x$ cited \\cite{a}.");
        let translated = masked.text.replace("Value", "Valeur");

        assert!(check(&masked.table, &translated).is_empty());
    }

    #[test]
    fn test_check_withDroppedPlaceholder_shouldReportMissing() {
        let masked = MaskEngine::mask("Value $x$ here.");
        let token = masked.table.tokens().next().unwrap().to_string();
        let translated = masked.text.replace(&token, "");

        let violations = check(&masked.table, &translated);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].class(), ViolationClass::MissingPlaceholder);
    }

    #[test]
    fn test_check_withDuplicatedPlaceholder_shouldReportCount() {
        let masked = MaskEngine::mask("Value $x$ here.");
        let token = masked.table.tokens().next().unwrap().to_string();
        let translated = format!("{} {}", masked.text, token);

        let violations = check(&masked.table, &translated);
        assert_eq!(
            violations,
            vec![Violation::DuplicatedPlaceholder {
                token,
                count: 2
            }]
        );
    }

    #[test]
    fn test_check_withInventedPlaceholder_shouldReportUnknown() {
        let masked = MaskEngine::mask("Value $x$ here.");
        let translated = format!("{} \u{27E6}MATH:0099\u{27E7}", masked.text);

        let violations = check(&masked.table, &translated);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].class(), ViolationClass::UnknownPlaceholder);
    }

    #[test]
    fn test_check_withMultipleViolations_shouldEnumerateAll() {
        let masked = MaskEngine::mask("$a$ then $b$ then $c$.");
        let tokens: Vec<String> = masked.table.tokens().map(String::from).collect();
        // Drop the first, duplicate the second
        let translated = masked
            .text
            .replace(&tokens[0], "")
            .replace(&tokens[1], &format!("{} {}", tokens[1], tokens[1]));

        let violations = check(&masked.table, &translated);
        assert_eq!(violations.len(), 2);
    }
}
