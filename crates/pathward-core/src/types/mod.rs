//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the guard pipeline:
//! - Access disciplines (`Discipline`)
//! - Decision outcomes (`Decision`) and where they are delivered (`ResponseChannel`)
//! - Predicate input values (`Value`)
//! - Error types (`PathwardError`)
//!
//! ## Decision vs. Fault
//!
//! A `Decision::Deny` is an expected outcome, never an error. `PathwardError`
//! is reserved for faults: malformed patterns at registration, payloads the
//! write chain cannot interpret, and predicates that break their contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Values handed to decision predicates, in positional order.
///
/// Pattern captures arrive as `Value::String`; operation arguments arrive as
/// whatever the host supplied.
pub type Value = serde_json::Value;

// =============================================================================
// DISCIPLINE
// =============================================================================

/// The three independently chained access disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    /// Reading a concrete path (fetch / subscribe).
    Read,
    /// Executing a named query motif within a namespace.
    Query,
    /// Applying a mutation to a path.
    Write,
}

impl Discipline {
    /// Lowercase name used in reasons and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Query => "query",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DECISION
// =============================================================================

/// Outcome of running a request through a chain.
///
/// Deny is terminal for the whole pipeline: once produced, no further guard
/// runs for that request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    /// The request may continue through the host pipeline.
    Allow,
    /// The request is rejected.
    Deny {
        /// Human-readable reason, naming the denied target.
        reason: String,
    },
}

impl Decision {
    /// Build a denial with the given reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    /// Whether this decision lets the request through.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The denial reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Deny { reason } => Some(reason),
        }
    }

    /// Deliver this decision to the host's response channel.
    ///
    /// Allow continues the host pipeline; Deny signals "unauthorized" with
    /// the reason string.
    pub fn dispatch<C: ResponseChannel + ?Sized>(&self, channel: &mut C) {
        match self {
            Self::Allow => channel.proceed(),
            Self::Deny { reason } => channel.unauthorized(reason),
        }
    }
}

/// The host's response channel for a single request.
pub trait ResponseChannel {
    /// Continue the host pipeline.
    fn proceed(&mut self);

    /// Reject the request as unauthorized.
    fn unauthorized(&mut self, reason: &str);
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Faults raised by the guard pipeline.
#[derive(Debug, Error)]
pub enum PathwardError {
    /// A path pattern could not be compiled. Raised at registration time.
    #[error("Malformed pattern '{pattern}': {reason}")]
    MalformedPattern {
        /// The offending pattern text.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A mutation payload has no derivable target path.
    #[error("Mutation '{method}' has no derivable path")]
    MissingMutationPath {
        /// The mutator method of the payload.
        method: String,
    },

    /// Every handle to a predicate's continuation was dropped unfired.
    #[error("Decision predicate for {subject} dropped its continuation without deciding")]
    AbandonedContinuation {
        /// The target the predicate was deciding on.
        subject: String,
    },

    /// No context is registered under the given name.
    #[error("Unknown context: {0}")]
    UnknownContext(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        proceeded: bool,
        rejected: Option<String>,
    }

    impl ResponseChannel for Recorder {
        fn proceed(&mut self) {
            self.proceeded = true;
        }

        fn unauthorized(&mut self, reason: &str) {
            self.rejected = Some(reason.to_string());
        }
    }

    #[test]
    fn allow_dispatches_proceed() {
        let mut channel = Recorder::default();
        Decision::Allow.dispatch(&mut channel);
        assert!(channel.proceeded);
        assert!(channel.rejected.is_none());
    }

    #[test]
    fn deny_dispatches_unauthorized_with_reason() {
        let mut channel = Recorder::default();
        Decision::deny("Unauthorized: read users.7 denied").dispatch(&mut channel);
        assert!(!channel.proceeded);
        assert_eq!(
            channel.rejected.as_deref(),
            Some("Unauthorized: read users.7 denied")
        );
    }

    #[test]
    fn decision_accessors() {
        assert!(Decision::Allow.is_allowed());
        assert_eq!(Decision::Allow.reason(), None);

        let denied = Decision::deny("nope");
        assert!(!denied.is_allowed());
        assert_eq!(denied.reason(), Some("nope"));
    }

    #[test]
    fn decision_serializes_tagged() {
        let json = serde_json::to_string(&Decision::deny("x")).expect("serialize");
        assert_eq!(json, r#"{"decision":"deny","reason":"x"}"#);

        let json = serde_json::to_string(&Decision::Allow).expect("serialize");
        assert_eq!(json, r#"{"decision":"allow"}"#);
    }

    #[test]
    fn discipline_display() {
        assert_eq!(Discipline::Read.to_string(), "read");
        assert_eq!(Discipline::Query.to_string(), "query");
        assert_eq!(Discipline::Write.to_string(), "write");
    }
}
