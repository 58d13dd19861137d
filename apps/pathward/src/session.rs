//! # Session Module
//!
//! JSON-backed sessions for the CLI host.
//!
//! The authorization core treats sessions as opaque; declarative rules read
//! fields out of this one by dotted name (`user.id`, `roles`).

use crate::error::AppError;
use serde_json::{Map, Value};

/// An already-authenticated session, as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    fields: Map<String, Value>,
}

impl Session {
    /// Create a session from a JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a session from JSON text. The top level must be an object.
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(text).map_err(|e| AppError::Json {
            what: "session",
            reason: e.to_string(),
        })?;

        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(AppError::Json {
                what: "session",
                reason: format!("expected an object, found {}", type_name(&other)),
            }),
        }
    }

    /// Look up a field by dotted name, descending into nested objects.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        let mut parts = name.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
