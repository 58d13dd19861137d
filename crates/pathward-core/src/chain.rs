//! # Guard Chain
//!
//! An ordered, append-only sequence of guards for one access discipline.
//!
//! ## Evaluation
//!
//! Guards run strictly in registration order, one at a time:
//! - A guard that does not apply defers to the next guard.
//! - A guard that applies invokes its predicate. Deny ends the chain
//!   immediately; Allow moves on to the next guard.
//!
//! Every applicable guard must approve (conjunctive semantics). When the
//! sequence is exhausted the chain's [`Fallback`] settles the request.
//!
//! ## Registration during evaluation
//!
//! `add` takes a short write lock; `run` works on a snapshot taken when it
//! starts. Guards appended while a request is in flight are not visited by
//! that request.

use crate::invoker::{DecisionInvoker, Predicate};
use crate::{Decision, Discipline, PathwardError, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

// =============================================================================
// PER-REQUEST EVALUATION STATE
// =============================================================================

/// Transient state for a single request's trip through a chain.
///
/// Created fresh per request and never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    matched: bool,
    matched_motifs: BTreeMap<String, bool>,
}

impl Evaluation {
    /// Create an empty evaluation record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any path guard matched the request's target.
    #[must_use]
    pub fn did_match(&self) -> bool {
        self.matched
    }

    /// Record that a path guard matched.
    pub fn mark_matched(&mut self) {
        self.matched = true;
    }

    /// Record that a query guard matched the named motif.
    pub fn mark_motif(&mut self, motif: &str) {
        self.matched_motifs.insert(motif.to_string(), true);
    }

    /// Whether a query guard matched the named motif.
    #[must_use]
    pub fn motif_matched(&self, motif: &str) -> bool {
        self.matched_motifs.get(motif).copied().unwrap_or(false)
    }

    /// Names of matched motifs, in sorted order.
    pub fn matched_motifs(&self) -> impl Iterator<Item = &str> {
        self.matched_motifs
            .iter()
            .filter(|(_, matched)| **matched)
            .map(|(name, _)| name.as_str())
    }
}

// =============================================================================
// GUARD & FALLBACK TRAITS
// =============================================================================

/// What an applicable guard asks the chain to run.
pub struct Invocation<'g, S> {
    /// The guard's decision predicate.
    pub predicate: &'g Predicate<S>,
    /// Positional predicate inputs.
    pub inputs: Vec<Value>,
    /// The target being decided on, used in reasons and logs.
    pub subject: String,
}

/// A registered rule that may apply to requests of type `R`.
pub trait Guard<S, R: ?Sized>: Send + Sync {
    /// Decide applicability.
    ///
    /// Returns `None` to defer, or the invocation to run. An applicable guard
    /// records its match in `evaluation` before returning.
    fn inspect<'g>(
        &'g self,
        request: &R,
        evaluation: &mut Evaluation,
    ) -> Result<Option<Invocation<'g, S>>, PathwardError>;
}

/// Settles a request once every guard in the chain has let it through.
pub trait Fallback<R: ?Sized>: Send + Sync {
    /// Produce the final decision.
    fn settle(&self, request: &R, evaluation: &Evaluation) -> Decision;
}

/// Fallback that allows whatever the guards let through.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl<R: ?Sized> Fallback<R> for PassThrough {
    fn settle(&self, _request: &R, _evaluation: &Evaluation) -> Decision {
        Decision::Allow
    }
}

// =============================================================================
// GUARD CHAIN
// =============================================================================

/// Append-only, ordered guards for one discipline.
pub struct GuardChain<G, F = PassThrough> {
    discipline: Discipline,
    guards: RwLock<Vec<Arc<G>>>,
    fallback: F,
}

impl<G> GuardChain<G, PassThrough> {
    /// Create an empty chain that allows when exhausted.
    #[must_use]
    pub fn new(discipline: Discipline) -> Self {
        Self::with_fallback(discipline, PassThrough)
    }
}

impl<G, F> GuardChain<G, F> {
    /// Create an empty chain settled by `fallback` when exhausted.
    #[must_use]
    pub fn with_fallback(discipline: Discipline, fallback: F) -> Self {
        Self {
            discipline,
            guards: RwLock::new(Vec::new()),
            fallback,
        }
    }

    /// The discipline this chain guards.
    #[must_use]
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Append a guard. Never reorders or removes existing guards.
    pub fn add(&self, guard: G) {
        self.guards
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(guard));
    }

    /// Number of registered guards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no guard has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<G>> {
        self.guards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `request` through every guard in registration order.
    pub async fn run<S, R>(
        &self,
        session: &Arc<S>,
        request: &R,
        evaluation: &mut Evaluation,
    ) -> Result<Decision, PathwardError>
    where
        S: Send + Sync + 'static,
        R: ?Sized,
        G: Guard<S, R>,
        F: Fallback<R>,
    {
        for guard in self.snapshot() {
            let Some(invocation) = guard.inspect(request, evaluation)? else {
                continue;
            };

            tracing::debug!(
                discipline = %self.discipline,
                subject = %invocation.subject,
                inputs = invocation.inputs.len(),
                "Guard applies"
            );

            let decision = DecisionInvoker::invoke(
                invocation.predicate,
                session,
                invocation.inputs,
                self.discipline,
                &invocation.subject,
            )
            .await?;

            if !decision.is_allowed() {
                return Ok(decision);
            }
        }

        Ok(self.fallback.settle(request, evaluation))
    }
}

impl<G: fmt::Display, F> GuardChain<G, F> {
    /// Human-readable description of each guard, in registration order.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.snapshot().iter().map(|guard| guard.to_string()).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
