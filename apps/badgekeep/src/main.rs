//! # badgekeep
//!
//! Push/pull store for shields.io endpoint badges.
//!
//! ```text
//!   CI job ──GET /garbage_in/──▶ ┌──────────────┐      ┌──────────────────┐
//!                                │  badgekeep   │─────▶│ Redis / redb /   │
//!   shields.io ◀─/garbage_out/── │ (axum + CLI) │◀─────│ memory store     │
//!                                └──────────────┘      └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server against Redis at DB_HOST:DB_PORT
//! API_KEY=s3cret badgekeep serve --host 0.0.0.0 --port 8080
//!
//! # Inspect the store directly
//! badgekeep list
//! badgekeep -B redb -D badges.redb get ci
//! ```

use badgekeep::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // BADGEKEEP_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("BADGEKEEP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "badgekeep=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if cli.shows_banner() {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  badgekeep v{}
  shields.io endpoint badges, pushed and pulled
"#,
        env!("CARGO_PKG_VERSION")
    );
}
