//! Write guard.

use super::capture_values;
use crate::chain::{Evaluation, Guard, Invocation};
use crate::invoker::Predicate;
use crate::pattern::{Matcher, PatternCompiler};
use crate::request::{MutationPayload, WriteRequest};
use crate::PathwardError;
use std::fmt;

/// Guards mutations whose target path matches a pattern.
///
/// On a match the predicate receives the path captures followed by the
/// mutation's arguments. The mutator name is recorded but not matched on.
pub struct WriteGuard<S> {
    mutator: String,
    matcher: Matcher,
    predicate: Predicate<S>,
}

impl<S> WriteGuard<S> {
    /// Compile `target` and pair it with `predicate`.
    pub fn new(
        mutator: impl Into<String>,
        target: &str,
        predicate: Predicate<S>,
    ) -> Result<Self, PathwardError> {
        Ok(Self {
            mutator: mutator.into(),
            matcher: PatternCompiler::compile(target)?,
            predicate,
        })
    }

    /// The advisory mutator name given at registration.
    #[must_use]
    pub fn mutator(&self) -> &str {
        &self.mutator
    }

    /// The compiled target pattern.
    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

impl<S, M> Guard<S, WriteRequest<S, M>> for WriteGuard<S>
where
    S: Send + Sync,
    M: MutationPayload,
{
    fn inspect<'g>(
        &'g self,
        request: &WriteRequest<S, M>,
        evaluation: &mut Evaluation,
    ) -> Result<Option<Invocation<'g, S>>, PathwardError> {
        let path = request.mutation.require_path()?;
        let Some(captures) = self.matcher.extract(path) else {
            return Ok(None);
        };

        evaluation.mark_matched();
        let mut inputs = capture_values(captures);
        inputs.extend(request.mutation.arguments());

        Ok(Some(Invocation {
            predicate: &self.predicate,
            inputs,
            subject: path.to_string(),
        }))
    }
}

impl<S> fmt::Display for WriteGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write {} {}", self.mutator, self.matcher)
    }
}
