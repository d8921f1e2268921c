/*!
 * Prompt templates for translation, repair, and terminology extraction.
 *
 * All prompts treat placeholder tokens as opaque: the model is told to
 * carry them through verbatim, and the critic enforces it afterwards.
 */

use crate::translation::terminology::TerminologyMap;
use crate::verification::Verdict;

/// System prompt for the main translation call
pub fn translator_system_prompt(
    source_language: &str,
    target_language: &str,
    terminology: &TerminologyMap,
) -> String {
    format!(
        "You are a professional academic translator specializing in LaTeX papers.\n\
         Translate the provided {source} LaTeX text into {target}, strictly adhering to the provided terminology.\n\
         \n\
         Terminology Dictionary:\n\
         {terms}\n\
         \n\
         Rules:\n\
         1. Placeholder preservation: tokens like \u{27E6}MATH:0001\u{27E7} MUST appear in the output exactly once each, \
         unchanged, at their correct logical positions. Never translate, reorder arbitrarily, or alter them.\n\
         2. LaTeX commands: do not translate command names like \\section or \\textbf. \
         Translate only the prose inside text-carrying arguments.\n\
         3. Use formal, precise academic register in the target language.\n\
         4. Return ONLY the translated text. No commentary, no code fences.",
        source = source_language,
        target = target_language,
        terms = terminology.to_json(),
    )
}

/// System prompt for the constrained repair call.
///
/// Names exactly the violations the critic found; the fixer must restore
/// the named placeholders and change nothing else.
pub fn fixer_system_prompt(
    target_language: &str,
    verdict: &Verdict,
    terminology: &TerminologyMap,
) -> String {
    let violations = verdict
        .violations
        .iter()
        .map(|v| format!("- {}", v))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a translation fixer for a LaTeX translation system.\n\
         A previous {target} translation failed its integrity check.\n\
         \n\
         Violations found:\n\
         {violations}\n\
         \n\
         You will receive the original masked text and the failed translation, separated by a line '---'.\n\
         Rewrite the translation so that exactly the placeholders named above are restored or deduplicated \
         and LaTeX brace/environment structure matches the original. Change nothing else.\n\
         \n\
         Terminology Dictionary:\n\
         {terms}\n\
         \n\
         Return ONLY the corrected translation.",
        target = target_language,
        violations = violations,
        terms = terminology.to_json(),
    )
}

/// Build the user content for a repair call
pub fn fixer_user_content(source_masked: &str, translated_masked: &str) -> String {
    format!("{}\n---\n{}", source_masked, translated_masked)
}

/// System prompt for the terminology extraction call
pub fn terminology_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        "You are an expert academic translator specializing in exact terminology.\n\
         Analyze the provided research paper title and abstract ({source}) and extract the specific technical terms, \
         then provide their standard academic {target} translations.\n\
         \n\
         Return ONLY a JSON object where keys are {source} terms and values are {target} translations. \
         Prefer established academic usage. No commentary.",
        source = source_language,
        target = target_language,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::Violation;

    #[test]
    fn test_translatorPrompt_shouldEmbedTerminology() {
        let mut map = TerminologyMap::default();
        map.insert("neural network", "réseau de neurones");

        let prompt = translator_system_prompt("English", "French", &map);
        assert!(prompt.contains("neural network"));
        assert!(prompt.contains("réseau de neurones"));
        assert!(prompt.contains("French"));
    }

    #[test]
    fn test_fixerPrompt_shouldNameEveryViolation() {
        let verdict = Verdict {
            violations: vec![
                Violation::MissingPlaceholder {
                    token: "\u{27E6}MATH:0001\u{27E7}".to_string(),
                },
                Violation::DuplicatedPlaceholder {
                    token: "\u{27E6}CMD:0002\u{27E7}".to_string(),
                    count: 2,
                },
            ],
        };

        let prompt = fixer_system_prompt("German", &verdict, &TerminologyMap::default());
        assert!(prompt.contains("\u{27E6}MATH:0001\u{27E7}"));
        assert!(prompt.contains("\u{27E6}CMD:0002\u{27E7}"));
    }
}
