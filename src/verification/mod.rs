/*!
 * Verification of translated-but-still-masked text.
 *
 * This module provides the Reflexion critic: a pure, deterministic
 * structural verifier run after every translation attempt and after
 * every repair attempt:
 *
 * - `placeholders`: Placeholder-set conservation (no token missing,
 *   duplicated, or invented)
 * - `balance`: Conservative brace and environment balance comparison
 *   between source and translation
 * - `critic`: Orchestrates both checks into a single verdict
 */

pub mod balance;
pub mod critic;
pub mod placeholders;

pub use critic::ReflexionCritic;

use std::fmt;

/// A single structural violation found by the critic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A placeholder from the mask table does not appear in the translation
    MissingPlaceholder {
        /// The absent token
        token: String,
    },
    /// A placeholder appears more than once in the translation
    DuplicatedPlaceholder {
        /// The repeated token
        token: String,
        /// How many times it appeared
        count: usize,
    },
    /// The translation contains a placeholder-shaped token not in the table
    UnknownPlaceholder {
        /// The invented token
        token: String,
    },
    /// The brace balance of the translation differs from the source
    UnbalancedBraces {
        /// Net open-minus-close delta of the source masked text
        expected: i64,
        /// Net delta of the translated masked text
        found: i64,
    },
    /// `\begin`/`\end` pairing for an environment name changed
    UnbalancedEnvironment {
        /// The environment name
        name: String,
        /// Human-readable description of the mismatch
        detail: String,
    },
}

impl Violation {
    /// Coarse class of the violation, used to detect repair loops that
    /// keep failing the same way.
    pub fn class(&self) -> ViolationClass {
        match self {
            Self::MissingPlaceholder { .. } => ViolationClass::MissingPlaceholder,
            Self::DuplicatedPlaceholder { .. } => ViolationClass::DuplicatedPlaceholder,
            Self::UnknownPlaceholder { .. } => ViolationClass::UnknownPlaceholder,
            Self::UnbalancedBraces { .. } => ViolationClass::UnbalancedBraces,
            Self::UnbalancedEnvironment { .. } => ViolationClass::UnbalancedEnvironment,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPlaceholder { token } => write!(f, "missing placeholder {}", token),
            Self::DuplicatedPlaceholder { token, count } => {
                write!(f, "placeholder {} appears {} times", token, count)
            }
            Self::UnknownPlaceholder { token } => write!(f, "unknown placeholder {}", token),
            Self::UnbalancedBraces { expected, found } => {
                write!(f, "brace balance changed from {} to {}", expected, found)
            }
            Self::UnbalancedEnvironment { name, detail } => {
                write!(f, "environment {} unbalanced: {}", name, detail)
            }
        }
    }
}

/// Discriminant-only view of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViolationClass {
    MissingPlaceholder,
    DuplicatedPlaceholder,
    UnknownPlaceholder,
    UnbalancedBraces,
    UnbalancedEnvironment,
}

/// The critic's result: pass, or every violation found
#[derive(Debug, Clone, Default)]
pub struct Verdict {
    /// All violations, in check order; empty means the text verified
    pub violations: Vec<Violation>,
}

impl Verdict {
    /// Whether the translation passed every check
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Sorted, deduplicated set of violation classes
    pub fn classes(&self) -> Vec<ViolationClass> {
        let mut classes: Vec<ViolationClass> =
            self.violations.iter().map(|v| v.class()).collect();
        classes.sort();
        classes.dedup();
        classes
    }

    /// One-line summary for logs and failure causes
    pub fn summary(&self) -> String {
        if self.passed() {
            "verified".to_string()
        } else {
            self.violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}
