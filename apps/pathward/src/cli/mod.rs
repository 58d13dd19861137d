//! # Pathward CLI Module
//!
//! This module implements the CLI interface for Pathward.
//!
//! ## Available Commands
//!
//! - `check read|query|write` - Check one request against the policy
//! - `rules` - List contexts and their registered guards
//! - `validate` - Load the policy and compile every pattern
//!
//! ## Configuration (Environment Variables)
//!
//! - `PATHWARD_POLICY`: Policy file used when `--policy` is not given
//!   (default: `pathward.toml`)
//! - `PATHWARD_EVAL_TIMEOUT_MS`: Upper bound on one evaluation (default: 5000)
//! - `PATHWARD_LOG_FORMAT`: `json` for machine-parseable logs

mod commands;

use crate::error::AppError;
use crate::policy::PolicyFile;
use clap::{Parser, Subcommand};
use pathward_core::DEFAULT_CONTEXT;
use std::path::PathBuf;

pub use commands::*;

/// Policy file used when neither `--policy` nor `PATHWARD_POLICY` is set.
pub const DEFAULT_POLICY_FILE: &str = "pathward.toml";

/// Default evaluation timeout: 5 seconds.
pub const DEFAULT_EVAL_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pathward - path-pattern access control
///
/// Checks reads, queries and writes against the guards declared in a
/// policy file. Exits 0 when allowed, 2 when denied, 1 on any fault.
#[derive(Parser, Debug)]
#[command(name = "pathward")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the policy file
    #[arg(short = 'P', long, global = true)]
    pub policy: Option<PathBuf>,

    /// Context to evaluate against
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONTEXT)]
    pub context: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Suppress the check report; only the exit status is meaningful
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a single request
    Check {
        /// The request to check
        #[command(subcommand)]
        request: CheckRequest,
    },

    /// List contexts and their guards
    Rules,

    /// Load the policy and compile every pattern
    Validate,
}

/// A request to check. JSON arguments may be given inline or as `@file`.
#[derive(Subcommand, Debug)]
pub enum CheckRequest {
    /// Read a concrete path
    Read {
        /// Path being read
        #[arg(short, long)]
        path: String,

        /// Session JSON object
        #[arg(short, long, default_value = "{}")]
        session: String,
    },

    /// Execute a query motif
    Query {
        /// Collection namespace
        #[arg(short, long)]
        namespace: String,

        /// Motif invocation, `name` or `name=<json-array>`; repeatable
        #[arg(short, long = "motif", required = true)]
        motifs: Vec<String>,

        /// Session JSON object
        #[arg(short, long, default_value = "{}")]
        session: String,
    },

    /// Apply a mutation
    Write {
        /// Mutation JSON: {"method": "set", "args": ["path", ...]}
        #[arg(short, long)]
        mutation: String,

        /// Session JSON object
        #[arg(short, long, default_value = "{}")]
        session: String,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Resolve the policy file: flag, then `PATHWARD_POLICY`, then the default.
pub fn resolve_policy_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| {
        std::env::var("PATHWARD_POLICY")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    })
    .unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_FILE))
}

/// Get the evaluation timeout from `PATHWARD_EVAL_TIMEOUT_MS`.
///
/// Missing, unparsable or zero values fall back to the default.
pub fn get_eval_timeout_from_env() -> u64 {
    std::env::var("PATHWARD_EVAL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_EVAL_TIMEOUT_MS)
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let policy_path = resolve_policy_path(cli.policy);
    let policy = PolicyFile::load(&policy_path)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Check { request } => {
            let output = CheckOutput {
                json_mode,
                quiet: cli.quiet,
            };
            let timeout_ms = get_eval_timeout_from_env();
            cmd_check(&policy, &cli.context, request, timeout_ms, output).await
        }
        Commands::Rules => cmd_rules(&policy, json_mode),
        Commands::Validate => cmd_validate(&policy, &policy_path, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_read() {
        let cli = Cli::try_parse_from([
            "pathward",
            "--policy",
            "acl.toml",
            "check",
            "read",
            "--path",
            "users.7",
            "--session",
            r#"{"user_id":"7"}"#,
        ])
        .expect("parse");

        assert_eq!(cli.policy, Some(PathBuf::from("acl.toml")));
        assert_eq!(cli.context, DEFAULT_CONTEXT);
        match cli.command {
            Commands::Check {
                request: CheckRequest::Read { path, session },
            } => {
                assert_eq!(path, "users.7");
                assert_eq!(session, r#"{"user_id":"7"}"#);
            }
            other => unreachable!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn query_motif_is_repeatable() {
        let cli = Cli::try_parse_from([
            "pathward", "check", "query", "-n", "users", "-m", "friendsOf", "-m", r#"byAge=[18]"#,
            "-C", "admin",
        ])
        .expect("parse");

        assert_eq!(cli.context, "admin");
        assert!(!cli.quiet);
        match cli.command {
            Commands::Check {
                request: CheckRequest::Query { motifs, session, .. },
            } => {
                assert_eq!(motifs, vec!["friendsOf", "byAge=[18]"]);
                assert_eq!(session, "{}");
            }
            other => unreachable!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["pathward"]).is_err());
    }

    #[test]
    fn query_requires_a_motif() {
        assert!(Cli::try_parse_from(["pathward", "check", "query", "-n", "users"]).is_err());
    }

    #[test]
    fn explicit_policy_flag_wins() {
        let path = resolve_policy_path(Some(PathBuf::from("explicit.toml")));
        assert_eq!(path, PathBuf::from("explicit.toml"));
    }
}
