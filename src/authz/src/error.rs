//! Error types for the authorization core

use thiserror::Error;

/// Authorization core errors
///
/// Evaluation itself never fails; these surface while building rules and
/// policies, compiling them, or talking to a repository.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A rule record failed validation
    #[error("Invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// A subject/resource/action pattern is malformed
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Invalid policy definition
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// The compiler cannot specialise this rule kind
    #[error("Rule #{rule_index} cannot be compiled: {reason}")]
    Uncompilable { rule_index: usize, reason: String },

    /// A persisted artifact does not hash to the id it claims
    #[error("Content id mismatch: expected {expected}, got {actual}")]
    ContentMismatch { expected: String, actual: String },

    /// Policy repository failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthzError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
