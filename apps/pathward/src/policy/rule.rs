//! Declarative decision rules.
//!
//! Policy files cannot carry closures, so each guard names one of these
//! rules. A rule sees the session and the guard's positional inputs
//! (captures, then operation arguments) and answers yes or no.

use crate::session::Session;
use pathward_core::{Caller, Predicate, Value};
use serde::{Deserialize, Serialize};

/// A decision rule, written inline in the policy file:
///
/// ```toml
/// rule = { kind = "session_equals_input", field = "user_id", input = 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Rule {
    /// Always approve.
    Allow,
    /// Always deny.
    Deny,
    /// Session field equals the input at position `input`.
    SessionEqualsInput {
        /// Dotted session field name.
        field: String,
        /// Zero-based input position.
        input: usize,
    },
    /// Session field is an array containing the input at position `input`.
    SessionContainsInput {
        /// Dotted session field name.
        field: String,
        /// Zero-based input position.
        input: usize,
    },
    /// Session field is `true`.
    SessionFlag {
        /// Dotted session field name.
        field: String,
    },
    /// Approve if any nested rule approves.
    AnyOf {
        /// Alternatives, tried in order.
        rules: Vec<Rule>,
    },
}

impl Rule {
    /// Decide for `session` given the guard's inputs.
    #[must_use]
    pub fn evaluate(&self, session: &Session, inputs: &[Value]) -> bool {
        match self {
            Self::Allow => true,
            Self::Deny => false,
            Self::SessionEqualsInput { field, input } => {
                match (session.field(field), inputs.get(*input)) {
                    (Some(value), Some(candidate)) => loosely_equal(value, candidate),
                    _ => false,
                }
            }
            Self::SessionContainsInput { field, input } => {
                match (session.field(field), inputs.get(*input)) {
                    (Some(Value::Array(items)), Some(candidate)) => {
                        items.iter().any(|item| loosely_equal(item, candidate))
                    }
                    _ => false,
                }
            }
            Self::SessionFlag { field } => session.field(field) == Some(&Value::Bool(true)),
            Self::AnyOf { rules } => rules.iter().any(|rule| rule.evaluate(session, inputs)),
        }
    }

    /// Wrap this rule as a guard predicate.
    #[must_use]
    pub fn into_predicate(self) -> Predicate<Session> {
        Predicate::from_fn(move |caller: &Caller<Session>, inputs: &[Value]| {
            self.evaluate(&caller.session, inputs)
        })
    }
}

/// Equality that treats `7` and `"7"` as the same: path captures are always
/// strings while session ids often are not.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (scalar_text(a), scalar_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
