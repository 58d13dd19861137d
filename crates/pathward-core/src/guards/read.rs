//! Read-path guard.

use super::capture_values;
use crate::chain::{Evaluation, Guard, Invocation};
use crate::invoker::Predicate;
use crate::pattern::{Matcher, PatternCompiler};
use crate::request::ReadRequest;
use crate::PathwardError;
use std::fmt;

/// Guards reads of paths matching a pattern.
///
/// On a match the predicate receives the pattern's captures, left to right.
pub struct ReadGuard<S> {
    matcher: Matcher,
    predicate: Predicate<S>,
}

impl<S> ReadGuard<S> {
    /// Compile `pattern` and pair it with `predicate`.
    pub fn new(pattern: &str, predicate: Predicate<S>) -> Result<Self, PathwardError> {
        Ok(Self {
            matcher: PatternCompiler::compile(pattern)?,
            predicate,
        })
    }

    /// The compiled target pattern.
    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

impl<S> Guard<S, ReadRequest<S>> for ReadGuard<S>
where
    S: Send + Sync,
{
    fn inspect<'g>(
        &'g self,
        request: &ReadRequest<S>,
        evaluation: &mut Evaluation,
    ) -> Result<Option<Invocation<'g, S>>, PathwardError> {
        let Some(captures) = self.matcher.extract(&request.target) else {
            return Ok(None);
        };

        evaluation.mark_matched();
        Ok(Some(Invocation {
            predicate: &self.predicate,
            inputs: capture_values(captures),
            subject: request.target.clone(),
        }))
    }
}

impl<S> fmt::Display for ReadGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read {}", self.matcher)
    }
}
