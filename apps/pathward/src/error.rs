//! # Error Module
//!
//! Errors surfaced by the Pathward binary.

use pathward_core::PathwardError;
use thiserror::Error;

/// Exit status for a request that was denied.
pub const EXIT_DENIED: i32 = 2;

/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Failures of the CLI host.
#[derive(Debug, Error)]
pub enum AppError {
    /// The authorization core reported a fault.
    #[error(transparent)]
    Pathward(#[from] PathwardError),

    /// A policy, session or mutation file could not be read.
    #[error("I/O error: {0}")]
    Io(String),

    /// The policy file is not valid TOML or does not fit the schema.
    #[error("Invalid policy: {0}")]
    Policy(String),

    /// A JSON argument (session, mutation, query arguments) is invalid.
    #[error("Invalid JSON for {what}: {reason}")]
    Json {
        /// Which argument was being parsed.
        what: &'static str,
        /// Parser message.
        reason: String,
    },

    /// Evaluation did not finish within the configured timeout.
    #[error("Evaluation timed out after {0} ms")]
    Timeout(u64),

    /// The checked request was denied.
    #[error("{0}")]
    Denied(String),
}

impl AppError {
    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Denied(_) => EXIT_DENIED,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_has_its_own_exit_code() {
        assert_eq!(AppError::Denied("no".into()).exit_code(), EXIT_DENIED);
        assert_eq!(AppError::Timeout(5).exit_code(), EXIT_FAILURE);
        assert_eq!(
            AppError::from(PathwardError::UnknownContext("x".into())).exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn core_faults_display_transparently() {
        let err = AppError::from(PathwardError::UnknownContext("admin".into()));
        assert_eq!(err.to_string(), "Unknown context: admin");
    }
}
