//! # Guards Module
//!
//! The three guard kinds, one per access discipline, and the default-deny
//! fallback that closes the read chain.
//!
//! - `ReadGuard`: path pattern over the read target
//! - `QueryGuard`: namespace + motif name over a query tuple
//! - `WriteGuard`: path pattern over the mutation's derived path
//! - `DefaultDenyGuard`: denies reads no guard matched

mod default_deny;
mod query;
mod read;
mod write;

pub use default_deny::DefaultDenyGuard;
pub use query::QueryGuard;
pub use read::ReadGuard;
pub use write::WriteGuard;

use crate::Value;

/// Pattern captures as predicate inputs.
fn capture_values(captures: Vec<&str>) -> Vec<Value> {
    captures
        .into_iter()
        .map(|capture| Value::String(capture.to_string()))
        .collect()
}
