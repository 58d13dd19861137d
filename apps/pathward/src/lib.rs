//! # Pathward
//!
//! Command-line host for the pathward-core authorization pipeline.
//!
//! Loads declarative policy files into guard contexts and checks individual
//! read, query and write requests against them.

pub mod cli;
pub mod error;
pub mod policy;
pub mod session;

pub use error::AppError;
pub use policy::{PolicyFile, Rule};
pub use session::Session;
