//! # Policy Module
//!
//! TOML policy files: named contexts, each with read, query and write rules.
//!
//! ```toml
//! [[context]]
//! name = "default"
//!
//! [[context.read]]
//! pattern = "users.*"
//! rule = { kind = "session_equals_input", field = "user_id", input = 0 }
//!
//! [[context.query]]
//! namespace = "users"
//! motif = "friendsOf"
//! rule = { kind = "session_equals_input", field = "user_id", input = 0 }
//!
//! [[context.write]]
//! mutator = "set"
//! target = "docs.*.title"
//! rule = { kind = "session_flag", field = "editor" }
//! ```
//!
//! Loading validates every pattern eagerly, so a malformed rule fails the
//! whole policy before any request is checked.

mod rule;

pub use rule::Rule;

use crate::error::AppError;
use crate::session::Session;
use pathward_core::{AccessControl, DEFAULT_CONTEXT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum policy file size (10 MB).
pub const MAX_POLICY_FILE_SIZE: u64 = 10 * 1024 * 1024;

// =============================================================================
// SCHEMA
// =============================================================================

/// A whole policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    /// Contexts, in declaration order.
    #[serde(default, rename = "context")]
    pub contexts: Vec<ContextPolicy>,
}

/// Rules registered into one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextPolicy {
    /// Context name.
    #[serde(default = "default_context_name")]
    pub name: String,
    /// Read-path guards.
    #[serde(default)]
    pub read: Vec<ReadRule>,
    /// Query guards.
    #[serde(default)]
    pub query: Vec<QueryRule>,
    /// Write guards.
    #[serde(default)]
    pub write: Vec<WriteRule>,
}

/// A read-path guard declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadRule {
    /// Path pattern.
    pub pattern: String,
    /// Decision rule; inputs are the pattern captures.
    pub rule: Rule,
}

/// A query guard declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryRule {
    /// Collection namespace.
    pub namespace: String,
    /// Motif name.
    pub motif: String,
    /// Decision rule; inputs are the motif arguments.
    pub rule: Rule,
}

/// A write guard declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteRule {
    /// Mutator name. Recorded for listings; not matched on.
    #[serde(default = "default_mutator")]
    pub mutator: String,
    /// Target path pattern.
    pub target: String,
    /// Decision rule; inputs are the captures then the mutation arguments.
    pub rule: Rule,
}

fn default_context_name() -> String {
    DEFAULT_CONTEXT.to_string()
}

fn default_mutator() -> String {
    "any".to_string()
}

// =============================================================================
// LOADING
// =============================================================================

impl PolicyFile {
    /// Parse a policy from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Policy(e.to_string()))
    }

    /// Read and parse a policy file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let canonical = validate_file_path(path)?;
        validate_file_size(&canonical, MAX_POLICY_FILE_SIZE)?;

        let text = std::fs::read_to_string(&canonical)
            .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
        let policy = Self::from_toml_str(&text)?;

        tracing::info!(
            path = %canonical.display(),
            contexts = policy.contexts.len(),
            guards = policy.guard_count(),
            "Loaded policy"
        );
        Ok(policy)
    }

    /// Total number of guard declarations.
    #[must_use]
    pub fn guard_count(&self) -> usize {
        self.contexts
            .iter()
            .map(|c| c.read.len() + c.query.len() + c.write.len())
            .sum()
    }

    /// Register every rule into a fresh host.
    ///
    /// The default context is current afterwards.
    pub fn build(&self) -> Result<AccessControl<Session>, AppError> {
        let mut acl = AccessControl::new();

        for context in &self.contexts {
            acl.context(&context.name);
            for read in &context.read {
                acl.read_path_access(&read.pattern, read.rule.clone().into_predicate())?;
            }
            for query in &context.query {
                acl.query_access(
                    &query.namespace,
                    &query.motif,
                    query.rule.clone().into_predicate(),
                );
            }
            for write in &context.write {
                acl.write_access(
                    &write.mutator,
                    &write.target,
                    write.rule.clone().into_predicate(),
                )?;
            }
        }

        acl.context(DEFAULT_CONTEXT);
        Ok(acl)
    }
}

/// Canonicalize `path` and ensure it names a regular file.
pub(crate) fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Reject files larger than `max_size` bytes.
pub(crate) fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AppError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pathward_core::Discipline;

    const POLICY: &str = r#"
[[context]]
name = "default"

[[context.read]]
pattern = "users.*"
rule = { kind = "session_equals_input", field = "user_id", input = 0 }

[[context.query]]
namespace = "users"
motif = "friendsOf"
rule = { kind = "allow" }

[[context]]
name = "admin"

[[context.write]]
target = "docs.*"
rule = { kind = "session_flag", field = "admin" }
"#;

    #[test]
    fn parses_contexts_and_defaults() {
        let policy = PolicyFile::from_toml_str(POLICY).expect("parse");
        assert_eq!(policy.contexts.len(), 2);
        assert_eq!(policy.guard_count(), 3);
        assert_eq!(policy.contexts[1].write[0].mutator, "any");
    }

    #[test]
    fn builds_host_with_default_current() {
        let acl = PolicyFile::from_toml_str(POLICY)
            .expect("parse")
            .build()
            .expect("build");

        assert_eq!(acl.current().name(), DEFAULT_CONTEXT);
        assert_eq!(acl.current().guard_count(Discipline::Read), 1);
        assert_eq!(acl.current().guard_count(Discipline::Query), 1);

        let admin = acl.get("admin").expect("admin");
        assert_eq!(admin.describe(), vec!["write any docs.*"]);
    }

    #[test]
    fn unnamed_context_is_default() {
        let policy = PolicyFile::from_toml_str(
            "[[context]]\n[[context.read]]\npattern = \"a\"\nrule = { kind = \"deny\" }\n",
        )
        .expect("parse");
        assert_eq!(policy.contexts[0].name, DEFAULT_CONTEXT);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = PolicyFile::from_toml_str("[[context]]\nname = \"x\"\nowner = \"me\"\n");
        assert!(matches!(result, Err(AppError::Policy(_))));
    }

    #[test]
    fn malformed_pattern_fails_build() {
        let policy = PolicyFile::from_toml_str(
            "[[context]]\n[[context.read]]\npattern = \"users..x\"\nrule = { kind = \"allow\" }\n",
        )
        .expect("parse");
        assert!(matches!(
            policy.build(),
            Err(AppError::Pathward(pathward_core::PathwardError::MalformedPattern { .. }))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = PolicyFile::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
