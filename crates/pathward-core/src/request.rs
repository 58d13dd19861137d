//! # Request Module
//!
//! Discipline-specific views of an incoming operation, and the accessors the
//! write chain uses to look inside mutation payloads.

use crate::{PathwardError, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// READ
// =============================================================================

/// A read (fetch / subscribe) of a concrete path.
#[derive(Debug)]
pub struct ReadRequest<S> {
    /// The requester's session.
    pub session: Arc<S>,
    /// The concrete path being read.
    pub target: String,
}

impl<S> ReadRequest<S> {
    /// Create a read request.
    pub fn new(session: Arc<S>, target: impl Into<String>) -> Self {
        Self {
            session,
            target: target.into(),
        }
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// A query: a namespace plus the motifs it invokes, each with its arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTuple {
    /// Collection namespace.
    pub namespace: String,
    /// Motif name to ordered argument list.
    pub motifs: BTreeMap<String, Vec<Value>>,
}

impl QueryTuple {
    /// Create a query against `namespace` with no motifs.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            motifs: BTreeMap::new(),
        }
    }

    /// Add a motif invocation.
    #[must_use]
    pub fn motif(mut self, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.motifs.insert(name.into(), args);
        self
    }
}

/// A query execution request.
#[derive(Debug)]
pub struct QueryRequest<S> {
    /// The requester's session.
    pub session: Arc<S>,
    /// The query being executed.
    pub query: QueryTuple,
}

impl<S> QueryRequest<S> {
    /// Create a query request.
    pub fn new(session: Arc<S>, query: QueryTuple) -> Self {
        Self { session, query }
    }
}

// =============================================================================
// WRITE
// =============================================================================

/// Accessors into a mutation payload owned by the host's transaction layer.
pub trait MutationPayload {
    /// The mutator method name.
    fn method(&self) -> &str;

    /// The path the mutation targets, if one can be derived.
    fn path(&self) -> Option<&str>;

    /// The mutation's arguments, excluding the path.
    fn arguments(&self) -> Vec<Value>;

    /// The target path, or a fault naming the mutator.
    fn require_path(&self) -> Result<&str, PathwardError> {
        self.path().ok_or_else(|| PathwardError::MissingMutationPath {
            method: self.method().to_string(),
        })
    }
}

/// A mutation as carried by a transaction: `args[0]` is the target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier assigned by the host.
    #[serde(default)]
    pub id: String,
    /// Mutator method, e.g. `set`, `del`, `push`.
    pub method: String,
    /// Path followed by the mutator's arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Transaction {
    /// Create a transaction.
    pub fn new(id: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            args,
        }
    }
}

impl MutationPayload for Transaction {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }

    fn arguments(&self) -> Vec<Value> {
        self.args.iter().skip(1).cloned().collect()
    }
}

/// A mutation request.
#[derive(Debug)]
pub struct WriteRequest<S, M = Transaction> {
    /// The requester's session.
    pub session: Arc<S>,
    /// The mutation being applied.
    pub mutation: M,
}

impl<S, M> WriteRequest<S, M> {
    /// Create a write request.
    pub fn new(session: Arc<S>, mutation: M) -> Self {
        Self { session, mutation }
    }
}

// =============================================================================
// TESTS
// =============================================================================
