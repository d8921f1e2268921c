/*!
 * Error types for the latrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether this error is worth retrying with backoff.
    ///
    /// Timeouts, connection drops, rate limits and 5xx responses are
    /// transient; authentication and parse failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::RequestFailed(_) => true,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur when reconstructing text from a mask table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskingError {
    /// The masked text references a placeholder that is not in the table
    #[error("Masked text references unknown placeholder {0}")]
    UnknownPlaceholder(String),

    /// A table entry was never referenced by the masked text
    #[error("Mask table entry {0} was never referenced during unmasking")]
    UnreferencedEntry(String),
}

/// Terminal failure causes for a translation unit.
///
/// A unit that exhausts its budget ends in exactly one of these; failures
/// are recorded per unit and never abort the run as a whole.
#[derive(Error, Debug)]
pub enum UnitFailure {
    /// The translator kept failing transiently until the retry budget ran out
    #[error("Transient collaborator error after {attempts} attempts: {last}")]
    TransientExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The last underlying error
        last: String,
    },

    /// The repair loop hit its bound without producing a verified translation
    #[error("Repair exhausted after {attempts} attempts: {unresolved}")]
    RepairExhausted {
        /// Number of repair attempts made
        attempts: u32,
        /// Summary of the violations still outstanding
        unresolved: String,
    },

    /// Unmasking failed on a verified unit - the critic let corruption through
    #[error("Critic soundness defect: verified text failed to unmask: {0}")]
    CriticSoundness(#[from] MaskingError),

    /// The run was cancelled between state transitions
    #[error("Cancelled")]
    Cancelled,

    /// A file operation on the unit failed
    #[error("IO error: {0}")]
    Io(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from masking or unmasking
    #[error("Masking error: {0}")]
    Masking(#[from] MaskingError),

    /// Error from a translation unit
    #[error("Unit error: {0}")]
    Unit(#[from] UnitFailure),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
