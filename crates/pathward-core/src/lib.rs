//! # pathward-core
//!
//! The authorization pipeline for Pathward - THE LOGIC.
//!
//! Decides, per incoming operation against a hierarchical keyed data space,
//! whether a caller may read a path, execute a named query, or apply a
//! mutation. The data store, session establishment and transport all belong
//! to the host; this crate only says yes or no.
//!
//! ## Pipeline
//!
//! ```text
//!   request ──► GuardChain (read | query | write)
//!                 │  guard 1: match? ──► DecisionInvoker ──► predicate(caller, inputs, next)
//!                 │  guard 2: match? ──► ...
//!                 ▼
//!               Fallback (read: DefaultDenyGuard, others: PassThrough)
//!                 │
//!                 ▼
//!               Decision::Allow | Decision::Deny { reason }
//! ```
//!
//! ## Guarantees
//!
//! - Guards run in registration order, one at a time
//! - Every applicable guard must approve; the first denial is final
//! - A read that no guard matched is denied
//! - Malformed patterns fail at registration, never at evaluation

// =============================================================================
// MODULES
// =============================================================================

pub mod chain;
pub mod context;
pub mod guards;
pub mod invoker;
pub mod pattern;
pub mod request;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Decision, Discipline, PathwardError, ResponseChannel, Value};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use chain::{Evaluation, Fallback, Guard, GuardChain, Invocation, PassThrough};
pub use context::{AccessControl, Context, DEFAULT_CONTEXT};
pub use guards::{DefaultDenyGuard, QueryGuard, ReadGuard, WriteGuard};
pub use invoker::{BoxFuture, Caller, DecisionInvoker, Next, Predicate};
pub use pattern::{Matcher, PatternCompiler};
pub use request::{
    MutationPayload, QueryRequest, QueryTuple, ReadRequest, Transaction, WriteRequest,
};
