/*!
 * Reflexion critic tests: conservation and balance checking through the
 * public API.
 */

use latrans::latex::masking::MaskEngine;
use latrans::verification::{ReflexionCritic, Violation, ViolationClass};

fn masked_sample() -> (String, latrans::MaskTable) {
    let masked = MaskEngine::mask(
        "The estimate $\\hat\\theta$ from \\cite{a} beats \\cite{b} on the \\textbf{held-out} split.",
    );
    (masked.text, masked.table)
}

#[test]
fn test_review_withIdentityTranslation_shouldPass() {
    let (text, table) = masked_sample();
    let verdict = ReflexionCritic::review(&table, &text, &text);

    assert!(verdict.passed());
    assert_eq!(verdict.summary(), "verified");
}

#[test]
fn test_review_withReorderedPlaceholders_shouldStillPass() {
    // Word order legitimately changes across languages; conservation is
    // about presence, not position.
    let (text, table) = masked_sample();
    let tokens: Vec<String> = table.tokens().map(String::from).collect();
    let reordered = {
        let mut t = text.clone();
        // Swap the two citation placeholders
        t = t.replace(&tokens[1], "\u{0}TMP\u{0}");
        t = t.replace(&tokens[2], &tokens[1]);
        t.replace("\u{0}TMP\u{0}", &tokens[2])
    };

    let verdict = ReflexionCritic::review(&table, &text, &reordered);
    assert!(verdict.passed());
}

#[test]
fn test_review_withEveryDefectAtOnce_shouldEnumerateAll() {
    let (text, table) = masked_sample();
    let tokens: Vec<String> = table.tokens().map(String::from).collect();

    let broken = text
        .replace(&tokens[0], "") // missing
        .replace(&tokens[1], &format!("{t} {t}", t = tokens[1])) // duplicated
        .replace("held-out", "held-out \u{27E6}ENV:0042\u{27E7} {"); // unknown + brace

    let verdict = ReflexionCritic::review(&table, &text, &broken);
    let classes = verdict.classes();

    assert!(classes.contains(&ViolationClass::MissingPlaceholder));
    assert!(classes.contains(&ViolationClass::DuplicatedPlaceholder));
    assert!(classes.contains(&ViolationClass::UnknownPlaceholder));
    assert!(classes.contains(&ViolationClass::UnbalancedBraces));
    assert_eq!(verdict.violations.len(), 4);
}

#[test]
fn test_review_violationDetails_shouldNameTheTokens() {
    let (text, table) = masked_sample();
    let token = table.tokens().next().unwrap().to_string();
    let broken = text.replace(&token, "");

    let verdict = ReflexionCritic::review(&table, &text, &broken);
    assert_eq!(
        verdict.violations,
        vec![Violation::MissingPlaceholder {
            token: token.clone()
        }]
    );
    assert!(verdict.summary().contains(&token));
}

#[test]
fn test_review_sameInputTwice_shouldGiveIdenticalVerdicts() {
    let (text, table) = masked_sample();
    let broken = format!("{} {{", text);

    let first = ReflexionCritic::review(&table, &text, &broken);
    let second = ReflexionCritic::review(&table, &text, &broken);

    assert_eq!(first.violations, second.violations);
}
