//! # Pathward - Access Rule Checker
//!
//! The main binary for the Pathward authorization pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/pathward (THE BINARY)                │
//! │                                                           │
//! │   ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   │
//! │   │    CLI      │──►│ Policy (TOML)│──►│   Sessions   │   │
//! │   │   (clap)    │   │   + Rules    │   │    (JSON)    │   │
//! │   └─────────────┘   └──────┬───────┘   └──────────────┘   │
//! │                            ▼                              │
//! │                   ┌─────────────────┐                     │
//! │                   │  pathward-core  │                     │
//! │                   │   (THE LOGIC)   │                     │
//! │                   └─────────────────┘                     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! pathward -P acl.toml validate
//! pathward -P acl.toml rules
//! pathward -P acl.toml check read --path users.7 --session '{"user_id":"7"}'
//! pathward -P acl.toml check write --mutation '{"method":"set","args":["docs.1.title","x"]}'
//! ```

use clap::Parser;
use pathward::AppError;
use pathward::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing. PATHWARD_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PATHWARD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pathward=info,pathward_core=warn".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Execute command
    match cli::execute(cli).await {
        Ok(()) => {}
        Err(e @ AppError::Denied(_)) => std::process::exit(e.exit_code()),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
