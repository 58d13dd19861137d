//! Query guard.

use crate::chain::{Evaluation, Guard, Invocation};
use crate::invoker::Predicate;
use crate::request::QueryRequest;
use crate::PathwardError;
use std::fmt;

/// Guards a named motif within a namespace.
///
/// On a match the predicate receives the motif's argument list.
pub struct QueryGuard<S> {
    namespace: String,
    motif: String,
    predicate: Predicate<S>,
}

impl<S> QueryGuard<S> {
    /// Guard `motif` queries against `namespace`.
    pub fn new(
        namespace: impl Into<String>,
        motif: impl Into<String>,
        predicate: Predicate<S>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            motif: motif.into(),
            predicate,
        }
    }

    /// The guarded namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The guarded motif name.
    #[must_use]
    pub fn motif(&self) -> &str {
        &self.motif
    }
}

impl<S> Guard<S, QueryRequest<S>> for QueryGuard<S>
where
    S: Send + Sync,
{
    fn inspect<'g>(
        &'g self,
        request: &QueryRequest<S>,
        evaluation: &mut Evaluation,
    ) -> Result<Option<Invocation<'g, S>>, PathwardError> {
        if request.query.namespace != self.namespace {
            return Ok(None);
        }
        let Some(args) = request.query.motifs.get(&self.motif) else {
            return Ok(None);
        };

        evaluation.mark_motif(&self.motif);
        Ok(Some(Invocation {
            predicate: &self.predicate,
            inputs: args.clone(),
            subject: format!("{}.{}", self.namespace, self.motif),
        }))
    }
}

impl<S> fmt::Display for QueryGuard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query {}.{}", self.namespace, self.motif)
    }
}
