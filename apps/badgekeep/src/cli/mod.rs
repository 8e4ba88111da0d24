//! # badgekeep CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server (default when no command is given)
//! - `list` - Print every stored badge document
//! - `get` - Print a badge payload as readers see it
//! - `put` - Create or replace a badge from JSON
//! - `message` - Update the message of an existing badge
//! - `delete` - Delete a badge

mod commands;

use crate::config::Config;
use crate::error::AppError;
use badgekeep_core::BackendKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// badgekeep - push and pull shields.io endpoint badges
///
/// Store settings come from DB_HOST, DB_PORT, API_KEY and the BADGEKEEP_*
/// environment variables; the global flags below override them.
#[derive(Parser, Debug)]
#[command(name = "badgekeep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Storage backend: "redis", "redb" or "memory"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<BackendKind>,

    /// Path to the redb database (redb backend)
    #[arg(short = 'D', long, global = true)]
    pub data: Option<PathBuf>,

    /// Redis host (redis backend)
    #[arg(long, global = true)]
    pub db_host: Option<String>,

    /// Redis port (redis backend)
    #[arg(long, global = true)]
    pub db_port: Option<u16>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Print every stored badge document
    List,

    /// Print a badge payload as readers see it (stale badges show "AWOL")
    Get {
        /// Badge name
        name: String,
    },

    /// Create or replace a badge
    Put {
        /// Badge name
        name: String,

        /// Badge payload; single quotes are accepted in place of double quotes
        #[arg(short, long)]
        data: String,

        /// Seconds until the badge goes stale
        #[arg(short, long)]
        expire: Option<String>,
    },

    /// Update the message of an existing badge
    Message {
        /// Badge name
        name: String,

        /// New message
        message: String,
    },

    /// Delete a badge
    Delete {
        /// Badge name
        name: String,
    },
}

impl Cli {
    /// Environment configuration with this invocation's flags applied.
    pub fn config(&self) -> Result<Config, AppError> {
        let mut config = Config::from_env()?;
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(host) = &self.db_host {
            config.db_host = host.clone();
        }
        if let Some(port) = self.db_port {
            config.db_port = port;
        }
        Ok(config)
    }

    /// The banner goes to stdout, so only the server prints it; the other
    /// commands' output stays machine-readable.
    pub fn shows_banner(&self) -> bool {
        !self.quiet
            && !self.json_mode
            && matches!(self.command, None | Some(Commands::Serve { .. }))
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let config = cli.config()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(&config, &host, port).await,
        None => cmd_serve(&config, "127.0.0.1", 8080).await,
        Some(Commands::List) => cmd_list(&config, json_mode),
        Some(Commands::Get { name }) => cmd_get(&config, &name),
        Some(Commands::Put { name, data, expire }) => cmd_put(&config, name, data, expire),
        Some(Commands::Message { name, message }) => cmd_message(&config, name, message),
        Some(Commands::Delete { name }) => cmd_delete(&config, &name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_put_with_expire() {
        let cli = Cli::parse_from([
            "badgekeep", "-B", "memory", "put", "ci", "--data", "{'message': 'ok'}", "--expire",
            "120",
        ]);
        assert_eq!(cli.backend, Some(BackendKind::Memory));
        match cli.command {
            Some(Commands::Put { name, data, expire }) => {
                assert_eq!(name, "ci");
                assert_eq!(data, "{'message': 'ok'}");
                assert_eq!(expire.as_deref(), Some("120"));
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["badgekeep", "--quiet"]);
        assert!(cli.quiet);
        assert!(cli.command.is_none());
    }

    #[test]
    fn banner_only_before_serving() {
        assert!(Cli::parse_from(["badgekeep"]).shows_banner());
        assert!(Cli::parse_from(["badgekeep", "serve", "--port", "9000"]).shows_banner());
        assert!(!Cli::parse_from(["badgekeep", "--quiet", "serve"]).shows_banner());
        assert!(!Cli::parse_from(["badgekeep", "list", "--json-mode"]).shows_banner());
        assert!(!Cli::parse_from(["badgekeep", "get", "ci"]).shows_banner());
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["badgekeep", "--backend", "sqlite", "list"]).is_err());
    }
}
