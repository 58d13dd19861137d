//! # Context Module
//!
//! Isolation scopes that own one guard chain per discipline, and the host
//! that registers rules into them.
//!
//! ## Lifecycle
//!
//! Contexts are created once and live as long as their host. Their chains are
//! only ever appended to. Registration conventionally happens before traffic
//! begins, but appending while requests are in flight is safe: in-flight
//! requests simply do not see the new guard.
//!
//! ## Example
//!
//! ```
//! use pathward_core::{AccessControl, Caller, Predicate, ReadRequest, Value};
//! use std::sync::Arc;
//!
//! struct User {
//!     id: String,
//! }
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().expect("rt");
//! # rt.block_on(async {
//! let mut acl = AccessControl::<User>::new();
//! acl.read_path_access(
//!     "users.*",
//!     Predicate::from_fn(|caller: &Caller<User>, inputs: &[Value]| {
//!         inputs.first().and_then(Value::as_str) == Some(caller.session.id.as_str())
//!     }),
//! )
//! .expect("valid pattern");
//!
//! let alice = Arc::new(User { id: "7".into() });
//! let decision = acl
//!     .current()
//!     .evaluate_read(&ReadRequest::new(alice, "users.7"))
//!     .await
//!     .expect("no fault");
//! assert!(decision.is_allowed());
//! # });
//! ```

use crate::chain::{Evaluation, GuardChain};
use crate::guards::{DefaultDenyGuard, QueryGuard, ReadGuard, WriteGuard};
use crate::invoker::Predicate;
use crate::request::{MutationPayload, QueryRequest, ReadRequest, WriteRequest};
use crate::{Decision, Discipline, PathwardError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name of the context every host starts with.
pub const DEFAULT_CONTEXT: &str = "default";

// =============================================================================
// CONTEXT
// =============================================================================

/// One guard chain per discipline.
///
/// The read chain is closed by [`DefaultDenyGuard`]; the query and write
/// chains allow whatever their guards let through.
pub struct Context<S> {
    name: String,
    read: GuardChain<ReadGuard<S>, DefaultDenyGuard>,
    query: GuardChain<QueryGuard<S>>,
    write: GuardChain<WriteGuard<S>>,
}

impl<S: Send + Sync + 'static> Context<S> {
    /// Create a context with empty chains.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read: GuardChain::with_fallback(Discipline::Read, DefaultDenyGuard),
            query: GuardChain::new(Discipline::Query),
            write: GuardChain::new(Discipline::Write),
        }
    }

    /// The context's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a read guard.
    pub fn add_read_guard(&self, guard: ReadGuard<S>) {
        tracing::debug!(context = %self.name, guard = %guard, "Registered guard");
        self.read.add(guard);
    }

    /// Append a query guard.
    pub fn add_query_guard(&self, guard: QueryGuard<S>) {
        tracing::debug!(context = %self.name, guard = %guard, "Registered guard");
        self.query.add(guard);
    }

    /// Append a write guard.
    pub fn add_write_guard(&self, guard: WriteGuard<S>) {
        tracing::debug!(context = %self.name, guard = %guard, "Registered guard");
        self.write.add(guard);
    }

    /// Number of guards registered for `discipline`.
    #[must_use]
    pub fn guard_count(&self, discipline: Discipline) -> usize {
        match discipline {
            Discipline::Read => self.read.len(),
            Discipline::Query => self.query.len(),
            Discipline::Write => self.write.len(),
        }
    }

    /// Descriptions of every registered guard, read chain first.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        let mut lines = self.read.describe();
        lines.extend(self.query.describe());
        lines.extend(self.write.describe());
        lines
    }

    /// Decide a read.
    pub async fn evaluate_read(
        &self,
        request: &ReadRequest<S>,
    ) -> Result<Decision, PathwardError> {
        Ok(self.evaluate_read_traced(request).await?.0)
    }

    /// Decide a read, returning the evaluation record as well.
    pub async fn evaluate_read_traced(
        &self,
        request: &ReadRequest<S>,
    ) -> Result<(Decision, Evaluation), PathwardError> {
        let mut evaluation = Evaluation::new();
        let decision = self
            .read
            .run(&request.session, request, &mut evaluation)
            .await?;
        Ok((decision, evaluation))
    }

    /// Decide a query.
    pub async fn evaluate_query(
        &self,
        request: &QueryRequest<S>,
    ) -> Result<Decision, PathwardError> {
        Ok(self.evaluate_query_traced(request).await?.0)
    }

    /// Decide a query, returning the evaluation record as well.
    pub async fn evaluate_query_traced(
        &self,
        request: &QueryRequest<S>,
    ) -> Result<(Decision, Evaluation), PathwardError> {
        let mut evaluation = Evaluation::new();
        let decision = self
            .query
            .run(&request.session, request, &mut evaluation)
            .await?;
        Ok((decision, evaluation))
    }

    /// Decide a write.
    pub async fn evaluate_write<M: MutationPayload>(
        &self,
        request: &WriteRequest<S, M>,
    ) -> Result<Decision, PathwardError> {
        Ok(self.evaluate_write_traced(request).await?.0)
    }

    /// Decide a write, returning the evaluation record as well.
    pub async fn evaluate_write_traced<M: MutationPayload>(
        &self,
        request: &WriteRequest<S, M>,
    ) -> Result<(Decision, Evaluation), PathwardError> {
        let mut evaluation = Evaluation::new();
        let decision = self
            .write
            .run(&request.session, request, &mut evaluation)
            .await?;
        Ok((decision, evaluation))
    }
}

// =============================================================================
// ACCESS CONTROL HOST
// =============================================================================

/// Registration host owning named contexts.
///
/// Registration calls target the current context and return the host so
/// they can be chained.
pub struct AccessControl<S> {
    contexts: BTreeMap<String, Arc<Context<S>>>,
    current: Arc<Context<S>>,
}

impl<S: Send + Sync + 'static> AccessControl<S> {
    /// Create a host with only the default context, which is current.
    #[must_use]
    pub fn new() -> Self {
        let current = Arc::new(Context::new(DEFAULT_CONTEXT));
        let mut contexts = BTreeMap::new();
        contexts.insert(DEFAULT_CONTEXT.to_string(), Arc::clone(&current));
        Self { contexts, current }
    }

    /// Make `name` the current registration target, creating it if needed.
    pub fn context(&mut self, name: &str) -> &mut Self {
        let context = self
            .contexts
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Context::new(name)));
        self.current = Arc::clone(context);
        self
    }

    /// The current registration target.
    #[must_use]
    pub fn current(&self) -> &Arc<Context<S>> {
        &self.current
    }

    /// Look up a context by name.
    pub fn get(&self, name: &str) -> Result<Arc<Context<S>>, PathwardError> {
        self.contexts
            .get(name)
            .cloned()
            .ok_or_else(|| PathwardError::UnknownContext(name.to_string()))
    }

    /// All contexts, in name order.
    pub fn contexts(&self) -> impl Iterator<Item = &Arc<Context<S>>> {
        self.contexts.values()
    }

    /// Guard reads of paths matching `pattern`.
    ///
    /// The predicate receives the pattern's captures. Fails if the pattern is
    /// malformed.
    pub fn read_path_access(
        &mut self,
        pattern: &str,
        predicate: Predicate<S>,
    ) -> Result<&mut Self, PathwardError> {
        let guard = ReadGuard::new(pattern, predicate)?;
        self.current.add_read_guard(guard);
        Ok(self)
    }

    /// Guard `motif` queries in `namespace`.
    ///
    /// The predicate receives the motif's arguments.
    pub fn query_access(
        &mut self,
        namespace: &str,
        motif: &str,
        predicate: Predicate<S>,
    ) -> &mut Self {
        self.current
            .add_query_guard(QueryGuard::new(namespace, motif, predicate));
        self
    }

    /// Guard mutations whose path matches `target`.
    ///
    /// The predicate receives the path captures followed by the mutation's
    /// arguments. Fails if the pattern is malformed.
    pub fn write_access(
        &mut self,
        mutator: &str,
        target: &str,
        predicate: Predicate<S>,
    ) -> Result<&mut Self, PathwardError> {
        let guard = WriteGuard::new(mutator, target, predicate)?;
        self.current.add_write_guard(guard);
        Ok(self)
    }
}

impl<S: Send + Sync + 'static> Default for AccessControl<S> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
