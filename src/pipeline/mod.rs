/*!
 * The per-unit translation pipeline.
 *
 * This module drives one translation unit through the state machine
 * `Pending → Masked → Translated → Verifying → {Verified, Repairing} →
 * Unmasked → Done`, with a terminal `Failed` reachable from any state
 * once a retry budget is exhausted:
 *
 * - `unit_pipeline`: The state machine driver
 * - `fixer`: Constrained repair of failing translations
 */

pub mod fixer;
pub mod unit_pipeline;

pub use fixer::Fixer;
pub use unit_pipeline::{ProcessedUnit, UnitPipeline};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag.
///
/// Checked between state transitions only - a transition in flight is
/// never interrupted, so partially masked or translated state is never
/// observable outside the pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a fresh, uncancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
