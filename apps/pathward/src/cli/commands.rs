//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::CheckRequest;
use crate::error::AppError;
use crate::policy::{PolicyFile, validate_file_path, validate_file_size};
use crate::session::Session;
use pathward_core::{
    Decision, Discipline, Evaluation, PathwardError, QueryRequest, QueryTuple, ReadRequest,
    ResponseChannel, Transaction, Value, WriteRequest,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// ARGUMENT HELPERS
// =============================================================================

/// Maximum size of a JSON argument file (1 MB).
pub const MAX_ARGUMENT_FILE_SIZE: u64 = 1024 * 1024;

/// Resolve a JSON argument: `@path` reads the file, anything else is inline.
fn read_json_arg(arg: &str) -> Result<String, AppError> {
    let Some(path) = arg.strip_prefix('@') else {
        return Ok(arg.to_string());
    };

    let canonical = validate_file_path(Path::new(path))?;
    validate_file_size(&canonical, MAX_ARGUMENT_FILE_SIZE)?;
    std::fs::read_to_string(&canonical)
        .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path, e)))
}

fn parse_session(arg: &str) -> Result<Arc<Session>, AppError> {
    Ok(Arc::new(Session::from_json(&read_json_arg(arg)?)?))
}

fn parse_args(arg: &str) -> Result<Vec<Value>, AppError> {
    let value: Value = serde_json::from_str(&read_json_arg(arg)?).map_err(|e| AppError::Json {
        what: "query arguments",
        reason: e.to_string(),
    })?;

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(AppError::Json {
            what: "query arguments",
            reason: "expected an array".to_string(),
        }),
    }
}

/// Parse `name` or `name=<json-array>` into a motif invocation.
fn parse_motif(arg: &str) -> Result<(String, Vec<Value>), AppError> {
    let (name, args) = match arg.split_once('=') {
        Some((name, args)) => (name, parse_args(args)?),
        None => (arg, Vec::new()),
    };

    if name.is_empty() {
        return Err(AppError::Json {
            what: "motif",
            reason: format!("missing motif name in '{}'", arg),
        });
    }
    Ok((name.to_string(), args))
}

fn parse_mutation(arg: &str) -> Result<Transaction, AppError> {
    serde_json::from_str(&read_json_arg(arg)?).map_err(|e| AppError::Json {
        what: "mutation",
        reason: e.to_string(),
    })
}

/// Bound an evaluation at the dispatch boundary.
async fn with_timeout<T>(
    timeout_ms: u64,
    evaluation: impl Future<Output = Result<T, PathwardError>>,
) -> Result<T, AppError> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), evaluation).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Timeout(timeout_ms)),
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// How `check` reports its decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOutput {
    /// Print a JSON report instead of text.
    pub json_mode: bool,
    /// Print nothing.
    pub quiet: bool,
}

/// Prints a decision as it is dispatched.
struct TerminalChannel<'a> {
    context: &'a str,
    discipline: Discipline,
    subject: &'a str,
    evaluation: &'a Evaluation,
    output: CheckOutput,
}

impl TerminalChannel<'_> {
    fn print_json(&self, decision: &str, reason: Option<&str>) {
        let output = serde_json::json!({
            "context": self.context,
            "discipline": self.discipline,
            "subject": self.subject,
            "decision": decision,
            "reason": reason,
            "matched": self.evaluation.did_match(),
            "matched_motifs": self.evaluation.matched_motifs().collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    }
}

impl ResponseChannel for TerminalChannel<'_> {
    fn proceed(&mut self) {
        if self.output.quiet {
            return;
        }
        if self.output.json_mode {
            self.print_json("allow", None);
            return;
        }
        println!(
            "ALLOW {} {} (context: {})",
            self.discipline, self.subject, self.context
        );
    }

    fn unauthorized(&mut self, reason: &str) {
        if self.output.quiet {
            return;
        }
        if self.output.json_mode {
            self.print_json("deny", Some(reason));
            return;
        }
        println!(
            "DENY  {} {} (context: {})",
            self.discipline, self.subject, self.context
        );
        println!("      {}", reason);
    }
}

/// Check a single request against the policy.
pub async fn cmd_check(
    policy: &PolicyFile,
    context_name: &str,
    request: CheckRequest,
    timeout_ms: u64,
    output: CheckOutput,
) -> Result<(), AppError> {
    let acl = policy.build()?;
    let context = acl.get(context_name)?;

    let (discipline, subject, (decision, evaluation)) = match request {
        CheckRequest::Read { path, session } => {
            let request = ReadRequest::new(parse_session(&session)?, path.clone());
            let outcome = with_timeout(timeout_ms, context.evaluate_read_traced(&request)).await?;
            (Discipline::Read, path, outcome)
        }
        CheckRequest::Query {
            namespace,
            motifs,
            session,
        } => {
            let mut query = QueryTuple::new(namespace.clone());
            for motif in &motifs {
                let (name, args) = parse_motif(motif)?;
                query = query.motif(name, args);
            }
            let names: Vec<&str> = query.motifs.keys().map(String::as_str).collect();
            let subject = format!("{}.{}", namespace, names.join(","));
            let request = QueryRequest::new(parse_session(&session)?, query);
            let outcome =
                with_timeout(timeout_ms, context.evaluate_query_traced(&request)).await?;
            (Discipline::Query, subject, outcome)
        }
        CheckRequest::Write { mutation, session } => {
            let mutation = parse_mutation(&mutation)?;
            let subject = mutation
                .args
                .first()
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<{}>", mutation.method));
            let request = WriteRequest::new(parse_session(&session)?, mutation);
            let outcome =
                with_timeout(timeout_ms, context.evaluate_write_traced(&request)).await?;
            (Discipline::Write, subject, outcome)
        }
    };

    tracing::info!(
        context = context_name,
        discipline = %discipline,
        subject = %subject,
        allowed = decision.is_allowed(),
        "Checked request"
    );

    let mut channel = TerminalChannel {
        context: context_name,
        discipline,
        subject: &subject,
        evaluation: &evaluation,
        output,
    };
    decision.dispatch(&mut channel);

    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny { reason } => Err(AppError::Denied(reason)),
    }
}

// =============================================================================
// RULES COMMAND
// =============================================================================

/// List contexts and their registered guards.
pub fn cmd_rules(policy: &PolicyFile, json_mode: bool) -> Result<(), AppError> {
    let acl = policy.build()?;

    if json_mode {
        let contexts: Vec<_> = acl
            .contexts()
            .map(|context| {
                serde_json::json!({
                    "name": context.name(),
                    "guards": context.describe(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "contexts": contexts }))
                .unwrap_or_default()
        );
        return Ok(());
    }

    println!("Pathward Rules");
    println!("==============");
    for context in acl.contexts() {
        println!();
        println!("Context: {}", context.name());
        let guards = context.describe();
        if guards.is_empty() {
            println!("  (no guards: every read is denied)");
        }
        for guard in guards {
            println!("  {}", guard);
        }
    }

    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Load the policy and compile every pattern.
pub fn cmd_validate(policy: &PolicyFile, path: &Path, json_mode: bool) -> Result<(), AppError> {
    let acl = policy.build()?;
    let contexts = acl.contexts().count();
    let guards = policy.guard_count();

    if json_mode {
        let output = serde_json::json!({
            "policy": path.to_string_lossy(),
            "valid": true,
            "contexts": contexts,
            "guards": guards,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Policy OK: {} ({} contexts, {} guards)",
        path.display(),
        contexts,
        guards
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
