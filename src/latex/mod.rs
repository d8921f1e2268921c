/*!
 * LaTeX structure handling: span classification and reversible masking.
 *
 * This module contains the pieces that make free-text rewriting safe for
 * LaTeX sources:
 *
 * - `classifier`: Splits a buffer into PROTECTED and TRANSLATABLE spans
 *   using a grammar-aware pass plus a regex fallback pass
 * - `masking`: Replaces protected spans with placeholder tokens and
 *   restores them exactly, with an integrity guarantee
 */

pub mod classifier;
pub mod masking;

// Re-export main types
pub use classifier::{Classification, ProtectedKind, Span, SpanKind};
pub use masking::{MaskEngine, MaskTable, MaskedBuffer};
