//! # Decision Invoker
//!
//! Adapts user-supplied decision predicates into the pass/deny protocol the
//! guard chains expect.
//!
//! Every predicate is treated as capable of completing asynchronously. It is
//! handed:
//! - a [`Caller`], exposing the requesting session as a single named field
//! - the ordered inputs (pattern captures, then operation arguments)
//! - a [`Next`] continuation it must fire exactly once with a boolean
//!
//! The invoker waits for the continuation before the chain moves on.
//!
//! ## Contract violations
//!
//! - Firing the continuation twice: later calls are ignored and logged as a
//!   defect.
//! - Dropping every handle to the continuation without firing it: reported
//!   as [`PathwardError::AbandonedContinuation`].
//! - Holding the continuation forever: the request hangs. There is no timeout
//!   here; hosts impose one at their dispatch boundary.

use crate::{Decision, Discipline, PathwardError, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Boxed future returned by asynchronous predicates.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

// =============================================================================
// CALLER
// =============================================================================

/// Execution scope a predicate runs in.
pub struct Caller<S> {
    /// The already-authenticated session of the requester. Opaque to the core.
    pub session: Arc<S>,
}

impl<S> Clone for Caller<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S> fmt::Debug for Caller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller").finish_non_exhaustive()
    }
}

// =============================================================================
// CONTINUATION
// =============================================================================

/// Single-fire continuation handed to every predicate.
///
/// Cloneable so it can be moved into spawned work; only the first call
/// across all clones counts.
#[derive(Clone)]
pub struct Next {
    slot: Arc<Mutex<Option<oneshot::Sender<bool>>>>,
    subject: Arc<str>,
}

impl Next {
    fn channel(subject: &str) -> (Self, oneshot::Receiver<bool>) {
        let (sender, receiver) = oneshot::channel();
        let next = Self {
            slot: Arc::new(Mutex::new(Some(sender))),
            subject: Arc::from(subject),
        };
        (next, receiver)
    }

    /// Resolve the decision: `true` lets the chain continue, `false` denies.
    pub fn call(&self, allowed: bool) {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => {
                if sender.send(allowed).is_err() {
                    tracing::debug!(
                        subject = %self.subject,
                        "Decision arrived after the request was abandoned"
                    );
                }
            }
            None => {
                tracing::error!(
                    event = "continuation_reinvoked",
                    subject = %self.subject,
                    allowed,
                    "Decision continuation invoked more than once; ignoring"
                );
            }
        }
    }

    /// Shorthand for `call(true)`.
    pub fn allow(&self) {
        self.call(true);
    }

    /// Shorthand for `call(false)`.
    pub fn deny(&self) {
        self.call(false);
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// PREDICATE
// =============================================================================

type ContinuationFn<S> = dyn Fn(Caller<S>, Vec<Value>, Next) + Send + Sync;
type SyncFn<S> = dyn Fn(&Caller<S>, &[Value]) -> bool + Send + Sync;
type AsyncFn<S> = dyn Fn(Caller<S>, Vec<Value>) -> BoxFuture<bool> + Send + Sync;

enum Kind<S> {
    Continuation(Arc<ContinuationFn<S>>),
    Sync(Arc<SyncFn<S>>),
    Async(Arc<AsyncFn<S>>),
}

/// A guard's decision predicate.
pub struct Predicate<S> {
    kind: Kind<S>,
}

impl<S: Send + Sync + 'static> Predicate<S> {
    /// Continuation-style predicate: must fire `next` exactly once, possibly
    /// from a spawned task.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Caller<S>, Vec<Value>, Next) + Send + Sync + 'static,
    {
        Self {
            kind: Kind::Continuation(Arc::new(f)),
        }
    }

    /// Synchronous predicate; the invoker fires the continuation with its
    /// result.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Caller<S>, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            kind: Kind::Sync(Arc::new(f)),
        }
    }

    /// Asynchronous predicate; the invoker awaits it, then fires the
    /// continuation with its result.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Caller<S>, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            kind: Kind::Async(Arc::new(move |caller: Caller<S>, inputs: Vec<Value>| {
                Box::pin(f(caller, inputs)) as BoxFuture<bool>
            })),
        }
    }

    /// Predicate that always approves.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::from_fn(|_, _| true)
    }

    /// Predicate that always denies.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::from_fn(|_, _| false)
    }
}

impl<S> Clone for Predicate<S> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Continuation(f) => Kind::Continuation(Arc::clone(f)),
            Kind::Sync(f) => Kind::Sync(Arc::clone(f)),
            Kind::Async(f) => Kind::Async(Arc::clone(f)),
        };
        Self { kind }
    }
}

impl<S> fmt::Debug for Predicate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match &self.kind {
            Kind::Continuation(_) => "continuation",
            Kind::Sync(_) => "sync",
            Kind::Async(_) => "async",
        };
        f.debug_struct("Predicate").field("style", &style).finish()
    }
}

// =============================================================================
// INVOKER
// =============================================================================

/// Runs a predicate and turns its verdict into a [`Decision`].
pub struct DecisionInvoker;

impl DecisionInvoker {
    /// Invoke `predicate` for `subject` with the session bound as caller.
    ///
    /// Resolves only once the predicate's continuation has fired.
    pub async fn invoke<S: Send + Sync + 'static>(
        predicate: &Predicate<S>,
        session: &Arc<S>,
        inputs: Vec<Value>,
        discipline: Discipline,
        subject: &str,
    ) -> Result<Decision, PathwardError> {
        let (next, verdict) = Next::channel(subject);
        let caller = Caller {
            session: Arc::clone(session),
        };

        match &predicate.kind {
            Kind::Continuation(f) => f(caller, inputs, next),
            Kind::Sync(f) => {
                let allowed = f(&caller, inputs.as_slice());
                next.call(allowed);
            }
            Kind::Async(f) => {
                let allowed = f(caller, inputs).await;
                next.call(allowed);
            }
        }

        let allowed = verdict
            .await
            .map_err(|_| PathwardError::AbandonedContinuation {
                subject: subject.to_string(),
            })?;

        if allowed {
            return Ok(Decision::Allow);
        }

        tracing::warn!(
            event = "access_denied",
            discipline = %discipline,
            subject,
            "Predicate denied access"
        );
        Ok(Decision::deny(format!(
            "Unauthorized: {} {} denied",
            discipline, subject
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct User {
        id: String,
    }

    fn session(id: &str) -> Arc<User> {
        Arc::new(User { id: id.to_string() })
    }

    async fn run(predicate: &Predicate<User>, user: &str, inputs: Vec<Value>) -> Decision {
        DecisionInvoker::invoke(predicate, &session(user), inputs, Discipline::Read, "users.7")
            .await
            .expect("invoke")
    }

    #[tokio::test]
    async fn sync_predicate_sees_session_and_inputs() {
        let predicate = Predicate::from_fn(|caller: &Caller<User>, inputs: &[Value]| {
            inputs.first().and_then(Value::as_str) == Some(caller.session.id.as_str())
        });

        assert_eq!(run(&predicate, "7", vec![json!("7")]).await, Decision::Allow);

        let denied = run(&predicate, "8", vec![json!("7")]).await;
        assert_eq!(denied.reason(), Some("Unauthorized: read users.7 denied"));
    }

    #[tokio::test]
    async fn continuation_may_fire_from_spawned_task() {
        let predicate = Predicate::new(|_caller: Caller<User>, inputs: Vec<Value>, next: Next| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                next.call(inputs.len() == 2);
            });
        });

        assert!(run(&predicate, "1", vec![json!(1), json!(2)]).await.is_allowed());
        assert!(!run(&predicate, "1", vec![json!(1)]).await.is_allowed());
    }

    #[tokio::test]
    async fn async_predicate_is_awaited() {
        let predicate = Predicate::from_async(|caller: Caller<User>, _inputs| async move {
            tokio::task::yield_now().await;
            caller.session.id == "admin"
        });

        assert!(run(&predicate, "admin", vec![]).await.is_allowed());
        assert!(!run(&predicate, "guest", vec![]).await.is_allowed());
    }

    #[tokio::test]
    async fn second_continuation_call_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let predicate = Predicate::new(move |_caller: Caller<User>, _inputs, next: Next| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.allow();
            next.deny();
        });

        assert_eq!(run(&predicate, "1", vec![]).await, Decision::Allow);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropped_continuation_is_a_fault() {
        let predicate = Predicate::new(|_caller: Caller<User>, _inputs, next: Next| drop(next));

        let result =
            DecisionInvoker::invoke(&predicate, &session("1"), vec![], Discipline::Write, "docs.1")
                .await;

        match result {
            Err(PathwardError::AbandonedContinuation { subject }) => assert_eq!(subject, "docs.1"),
            other => unreachable!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn predicate_debug_names_style() {
        let predicate: Predicate<User> = Predicate::allow_all();
        assert_eq!(format!("{:?}", predicate), r#"Predicate { style: "sync" }"#);
    }
}
