//! # Property-Based Tests
//!
//! Pattern matching and chain composition invariants, checked with proptest.

use pathward_core::{
    AccessControl, Caller, PatternCompiler, Predicate, ReadRequest, Value,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;

/// A single pattern segment: a literal or a wildcard.
fn segment() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        3 => "[a-z0-9]{1,6}".prop_map(Some),
        1 => Just(None),
    ]
}

fn pattern_text(segments: &[Option<String>]) -> String {
    segments
        .iter()
        .map(|s| s.clone().unwrap_or_else(|| "*".to_string()))
        .collect::<Vec<_>>()
        .join(".")
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A path built by filling every wildcard matches, and yields the fillers
    /// as captures in order.
    #[test]
    fn filled_pattern_matches_with_ordered_captures(
        segments in vec(segment(), 1..8),
        fillers in vec("[A-Z0-9]{1,4}", 8)
    ) {
        let pattern = pattern_text(&segments);
        let matcher = PatternCompiler::compile(&pattern).expect("compile");

        let mut expected = Vec::new();
        let mut fill = fillers.iter();
        let path = segments
            .iter()
            .map(|s| match s {
                Some(literal) => literal.clone(),
                None => {
                    let filler = fill.next().cloned().unwrap_or_default();
                    expected.push(filler.clone());
                    filler
                }
            })
            .collect::<Vec<_>>()
            .join(".");

        prop_assert!(matcher.test(&path));
        let captures = matcher.extract(&path).expect("captures");
        prop_assert_eq!(captures, expected.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert_eq!(matcher.capture_count(), expected.len());
    }

    /// Adding or removing a segment always breaks the match.
    #[test]
    fn segment_count_must_be_equal(
        segments in vec(segment(), 1..8),
        extra in "[a-z]{1,4}"
    ) {
        let pattern = pattern_text(&segments);
        let matcher = PatternCompiler::compile(&pattern).expect("compile");
        let path = segments
            .iter()
            .map(|s| s.clone().unwrap_or_else(|| "x".to_string()))
            .collect::<Vec<_>>();

        let longer = format!("{}.{}", path.join("."), extra);
        prop_assert!(!matcher.test(&longer));

        let shorter = path[..path.len() - 1].join(".");
        prop_assert!(!matcher.test(&shorter));
    }

    /// Changing any literal segment breaks the match.
    #[test]
    fn literal_mismatch_fails(
        segments in vec("[a-z]{1,6}", 1..6),
        index in any::<prop::sample::Index>()
    ) {
        let pattern = segments.join(".");
        let matcher = PatternCompiler::compile(&pattern).expect("compile");

        let mut path = segments.clone();
        let i = index.index(path.len());
        path[i] = format!("{}Z", path[i]);

        prop_assert!(matcher.test(&pattern));
        prop_assert!(!matcher.test(&path.join(".")));
    }

    /// Compiling the same text twice yields equal matchers.
    #[test]
    fn compilation_is_deterministic(segments in vec(segment(), 0..8)) {
        let pattern = pattern_text(&segments);
        let a = PatternCompiler::compile(&pattern).expect("compile");
        let b = PatternCompiler::compile(&pattern).expect("compile");
        prop_assert_eq!(a, b);
    }

    /// A read matched by several guards is allowed iff every one approves.
    #[test]
    fn conjunctive_chain(verdicts in vec(any::<bool>(), 1..6)) {
        let mut acl = AccessControl::<()>::new();
        for &verdict in &verdicts {
            acl.read_path_access(
                "docs.*",
                Predicate::from_fn(move |_: &Caller<()>, _: &[Value]| verdict),
            )
            .expect("register");
        }

        let decision = runtime()
            .block_on(
                acl.current()
                    .evaluate_read(&ReadRequest::new(Arc::new(()), "docs.1")),
            )
            .expect("evaluate");

        prop_assert_eq!(decision.is_allowed(), verdicts.iter().all(|v| *v));
    }
}
