/*!
 * State machine driver for one translation unit.
 *
 * Stages within a unit run strictly sequentially; only the controller
 * runs multiple units concurrently. Every external call is bounded by
 * the service's timeout/retry policy, every repair loop by the
 * configured attempt budget, so the machine always terminates in `Done`
 * or `Failed`. A unit's failure never propagates to its siblings.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::app_config::Config;
use crate::errors::UnitFailure;
use crate::latex::masking::{MaskEngine, MaskTable};
use crate::project::unit::{TranslationUnit, UnitState};
use crate::translation::chunking::split_chunks;
use crate::translation::service::TranslationService;
use crate::translation::terminology::TerminologyMap;
use crate::verification::{ReflexionCritic, ViolationClass};

use super::fixer::Fixer;
use super::CancelFlag;

/// Result of driving one unit to a terminal state
#[derive(Debug)]
pub struct ProcessedUnit {
    /// Terminal state the unit reached
    pub state: UnitState,
    /// Final unmasked text, present only when the unit reached `Done`
    pub final_text: Option<String>,
    /// The unit's mask table, persisted for audit
    pub mask_table: MaskTable,
    /// Number of chunks the unit was split into
    pub chunks: usize,
    /// Wall-clock processing time
    pub duration: Duration,
}

/// Drives translation units through the processing state machine
pub struct UnitPipeline {
    service: Arc<TranslationService>,
    terminology: Arc<TerminologyMap>,
    max_repair_attempts: u32,
    max_chars_per_chunk: usize,
    cancel: CancelFlag,
}

impl UnitPipeline {
    /// Create a pipeline bound to a service, a shared terminology map,
    /// and the configured bounds
    pub fn new(
        service: Arc<TranslationService>,
        terminology: Arc<TerminologyMap>,
        config: &Config,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            service,
            terminology,
            max_repair_attempts: config.pipeline.max_repair_attempts,
            max_chars_per_chunk: config.translation.common.max_chars_per_chunk,
            cancel,
        }
    }

    /// Process one unit to a terminal state. Never panics and never
    /// returns early with an error - failures land in
    /// `UnitState::Failed` on the unit and in the returned outcome.
    pub async fn process(&self, unit: &mut TranslationUnit) -> ProcessedUnit {
        let started = Instant::now();

        match self.drive(unit).await {
            Ok((final_text, table, chunks)) => {
                info!("{}: done", unit.name());
                ProcessedUnit {
                    state: unit.state.clone(),
                    final_text: Some(final_text),
                    mask_table: table,
                    chunks,
                    duration: started.elapsed(),
                }
            }
            Err(failure) => {
                error!("{}: failed: {}", unit.name(), failure.cause);
                self.transition(
                    unit,
                    UnitState::Failed {
                        cause: failure.cause,
                    },
                );
                ProcessedUnit {
                    state: unit.state.clone(),
                    final_text: None,
                    mask_table: failure.mask_table,
                    chunks: failure.chunks,
                    duration: started.elapsed(),
                }
            }
        }
    }

    /// The state machine proper. Returns the unmasked final text, the
    /// mask table and the chunk count on success.
    async fn drive(
        &self,
        unit: &mut TranslationUnit,
    ) -> Result<(String, MaskTable, usize), DriveFailure> {
        self.check_cancel(&MaskTable::default(), 0)?;

        // Pending -> Masked. Masking always succeeds: the classifier
        // degrades on malformed input instead of failing.
        let masked = MaskEngine::mask(&unit.content);
        if masked.degraded {
            warn!("{}: degraded classification", unit.name());
        }
        self.transition(unit, UnitState::Masked);

        let source_chunks = split_chunks(&masked.text, self.max_chars_per_chunk);
        let chunk_count = source_chunks.len();
        debug!(
            "{}: {} chunks, {} masked spans",
            unit.name(),
            chunk_count,
            masked.table.len()
        );

        // Masked -> Translated: translate chunk by chunk
        let mut translated: Vec<String> = Vec::with_capacity(chunk_count);
        for chunk in &source_chunks {
            self.check_cancel(&masked.table, chunk_count)?;

            if chunk.trim().is_empty() {
                translated.push(chunk.clone());
                continue;
            }
            if let Some(hit) = self.service.cache.get(
                chunk,
                &self.service.source_language,
                &self.service.target_language,
            ) {
                translated.push(hit);
                continue;
            }

            match self.service.translate_chunk(chunk, &self.terminology).await {
                Ok(text) => translated.push(text),
                Err(exhausted) => {
                    return Err(DriveFailure::new(
                        UnitFailure::TransientExhausted {
                            attempts: exhausted.attempts,
                            last: exhausted.error.to_string(),
                        },
                        masked.table,
                        chunk_count,
                    ));
                }
            }
        }
        self.transition(unit, UnitState::Translated);

        // Translated -> Verifying -> {Verified | Repairing} loop,
        // bounded by the repair budget.
        let mut repair_attempts = 0u32;
        let mut last_classes: Option<Vec<ViolationClass>> = None;

        let verified = loop {
            self.check_cancel(&masked.table, chunk_count)?;
            self.transition(unit, UnitState::Verifying);

            let joined = translated.concat();
            let verdict = ReflexionCritic::review(&masked.table, &masked.text, &joined);
            if verdict.passed() {
                self.transition(unit, UnitState::Verified);
                break joined;
            }

            if repair_attempts >= self.max_repair_attempts {
                return Err(DriveFailure::new(
                    UnitFailure::RepairExhausted {
                        attempts: repair_attempts,
                        unresolved: verdict.summary(),
                    },
                    masked.table,
                    chunk_count,
                ));
            }

            self.transition(unit, UnitState::Repairing);
            repair_attempts += 1;

            // When a fixer pass already failed with the same violation
            // classes, local patching is looping - escalate to a fresh
            // re-translation of the affected chunks.
            let escalate = last_classes.as_ref() == Some(&verdict.classes());
            last_classes = Some(verdict.classes());

            let mut offending = self.offending_chunks(&masked.table, &source_chunks, &translated);
            if offending.is_empty() {
                // Violations only visible at unit scope (a token that
                // migrated between chunks); rebuild everything.
                offending = (0..chunk_count).collect();
            }
            debug!(
                "{}: repair attempt {}/{} over {} chunks (escalate: {})",
                unit.name(),
                repair_attempts,
                self.max_repair_attempts,
                offending.len(),
                escalate
            );

            for index in offending {
                self.check_cancel(&masked.table, chunk_count)?;
                let source_chunk = &source_chunks[index];
                let chunk_table = masked.table.subset_for(source_chunk);
                let chunk_verdict =
                    ReflexionCritic::review(&chunk_table, source_chunk, &translated[index]);

                let repaired = if escalate {
                    self.service
                        .translate_chunk(source_chunk, &self.terminology)
                        .await
                } else {
                    Fixer::repair(
                        &self.service,
                        source_chunk,
                        &translated[index],
                        &chunk_verdict,
                        &self.terminology,
                    )
                    .await
                };

                match repaired {
                    Ok(text) => translated[index] = text,
                    Err(exhausted) => {
                        return Err(DriveFailure::new(
                            UnitFailure::TransientExhausted {
                                attempts: exhausted.attempts,
                                last: exhausted.error.to_string(),
                            },
                            masked.table,
                            chunk_count,
                        ));
                    }
                }
            }
            self.transition(unit, UnitState::Translated);
        };

        // Verified -> Unmasked. Given a Verified verdict this cannot
        // fail; if it does the critic is unsound and the unit must fail
        // loudly instead of emitting corrupted output.
        let final_text = match MaskEngine::unmask(&verified, &masked.table) {
            Ok(text) => text,
            Err(reconstruction) => {
                debug_assert!(
                    false,
                    "unmask failed on verified text: {}",
                    reconstruction
                );
                return Err(DriveFailure::new(
                    UnitFailure::CriticSoundness(reconstruction),
                    masked.table,
                    chunk_count,
                ));
            }
        };
        self.transition(unit, UnitState::Unmasked);

        // Only verified chunk translations enter the cache, so repair
        // re-translations can never be served a rejected attempt.
        for (source_chunk, translated_chunk) in source_chunks.iter().zip(&translated) {
            if !source_chunk.trim().is_empty() {
                self.service.cache.store(
                    source_chunk,
                    &self.service.source_language,
                    &self.service.target_language,
                    translated_chunk,
                );
            }
        }

        self.transition(unit, UnitState::Done);
        Ok((final_text, masked.table, chunk_count))
    }

    /// Indices of chunks whose own placeholder set or balance is broken
    fn offending_chunks(
        &self,
        table: &MaskTable,
        source_chunks: &[String],
        translated: &[String],
    ) -> Vec<usize> {
        source_chunks
            .iter()
            .zip(translated)
            .enumerate()
            .filter_map(|(index, (source, translation))| {
                let chunk_table = table.subset_for(source);
                let verdict = ReflexionCritic::review(&chunk_table, source, translation);
                (!verdict.passed()).then_some(index)
            })
            .collect()
    }

    fn transition(&self, unit: &mut TranslationUnit, state: UnitState) {
        debug!("{}: {} -> {}", unit.name(), unit.state.label(), state.label());
        unit.state = state;
    }

    fn check_cancel(&self, table: &MaskTable, chunks: usize) -> Result<(), DriveFailure> {
        if self.cancel.is_cancelled() {
            return Err(DriveFailure::new(
                UnitFailure::Cancelled,
                table.clone(),
                chunks,
            ));
        }
        Ok(())
    }
}

/// Internal failure carrier keeping the audit table with the cause
struct DriveFailure {
    cause: String,
    mask_table: MaskTable,
    chunks: usize,
}

impl DriveFailure {
    fn new(failure: UnitFailure, mask_table: MaskTable, chunks: usize) -> Self {
        Self {
            cause: failure.to_string(),
            mask_table,
            chunks,
        }
    }
}
