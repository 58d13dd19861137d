//! Default-deny fallback for the read chain.

use crate::chain::{Evaluation, Fallback};
use crate::request::ReadRequest;
use crate::Decision;

/// Closes the read chain: a read that no guard matched is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDenyGuard;

impl<S> Fallback<ReadRequest<S>> for DefaultDenyGuard {
    fn settle(&self, request: &ReadRequest<S>, evaluation: &Evaluation) -> Decision {
        if evaluation.did_match() {
            return Decision::Allow;
        }

        tracing::warn!(
            event = "access_denied",
            discipline = "read",
            subject = %request.target,
            reason = "no_matching_guard",
            "No access control declared for path"
        );
        Decision::deny(format!(
            "Unauthorized: No access control declared for path {}",
            request.target
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unmatched_read_is_denied() {
        let request = ReadRequest::new(Arc::new(()), "secrets.1");
        let decision = DefaultDenyGuard.settle(&request, &Evaluation::new());
        assert_eq!(
            decision.reason(),
            Some("Unauthorized: No access control declared for path secrets.1")
        );
    }

    #[test]
    fn matched_read_is_allowed() {
        let request = ReadRequest::new(Arc::new(()), "users.1");
        let mut evaluation = Evaluation::new();
        evaluation.mark_matched();
        assert!(DefaultDenyGuard.settle(&request, &evaluation).is_allowed());
    }
}
