/*!
 * Constrained repair of failing translations.
 *
 * The fixer takes a chunk that failed verification and asks the model to
 * restore exactly the placeholders and structure the critic flagged,
 * changing nothing else. It never touches the mask table - it only sees
 * tokens, never the protected originals, so it cannot corrupt the
 * mapping.
 */

use log::debug;

use crate::translation::prompts;
use crate::translation::service::{ExhaustedRetries, TranslationService};
use crate::translation::terminology::TerminologyMap;
use crate::verification::Verdict;

/// Repairs a failing translated chunk via constrained re-generation
pub struct Fixer;

impl Fixer {
    /// Produce a corrected translated chunk from the critic's verdict.
    ///
    /// The prompt names exactly the violations found; escalation to a
    /// full re-translation on repeated failure is the pipeline's call,
    /// not the fixer's.
    pub async fn repair(
        service: &TranslationService,
        source_masked: &str,
        translated_masked: &str,
        verdict: &Verdict,
        terminology: &TerminologyMap,
    ) -> Result<String, ExhaustedRetries> {
        debug!(
            "Fixer repairing chunk with {} violations",
            verdict.violations.len()
        );

        let system = prompts::fixer_system_prompt(&service.target_language, verdict, terminology);
        let user = prompts::fixer_user_content(source_masked, translated_masked);
        service.repair_chunk(&system, &user).await
    }
}
