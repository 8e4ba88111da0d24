//! # CLI Command Implementations
//!
//! Each command opens the configured store and runs one badge operation
//! against it, the same operation the matching HTTP route runs.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::error::AppError;
use badgekeep_core::{Backend, BackendKind, BadgeService, WriteRequest};
use serde::Serialize;

fn open_service(config: &Config) -> Result<BadgeService<Backend>, AppError> {
    Ok(BadgeService::new(config.open_backend()?))
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(config: &Config, host: &str, port: u16) -> Result<(), AppError> {
    let service = open_service(config)?;

    println!("badgekeep server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", config.backend);
    match config.backend {
        BackendKind::Redis => {
            println!("  Redis:    {}:{}", config.db_host, config.db_port);
        }
        BackendKind::Redb => {
            println!("  Database: {:?}", config.data_path);
        }
        BackendKind::Memory => {}
    }
    println!();
    println!("Endpoints:");
    println!("  GET /garbage_out/ - Read a badge");
    println!("  GET /garbage_in/  - Write a badge");
    println!("  GET /list/        - List badges");
    println!("  GET /delete       - Delete a badge");
    println!("  GET /health       - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(service, config.api_key.clone());
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state, config.rate_limit).await
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// Print every stored badge document.
pub fn cmd_list(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let service = open_service(config)?;
    let documents = service.list_badges()?;

    if json_mode {
        print_json(&documents);
        return Ok(());
    }

    println!("{} badge(s) in {} store", documents.len(), config.backend);
    for document in &documents {
        let label = document
            .format
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        let message = document
            .format
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        println!(
            "  {:<24} {:<24} last_seen={:.0} expires={}s",
            label, message, document.meta.last_seen, document.meta.expires
        );
    }
    Ok(())
}

// =============================================================================
// GET COMMAND
// =============================================================================

/// Print a badge payload as readers see it.
pub fn cmd_get(config: &Config, name: &str) -> Result<(), AppError> {
    let service = open_service(config)?;
    let format = service.read_badge(Some(name))?;
    print_json(&format);
    Ok(())
}

// =============================================================================
// PUT / MESSAGE COMMANDS
// =============================================================================

/// Create or replace a badge.
pub fn cmd_put(
    config: &Config,
    name: String,
    data: String,
    expire: Option<String>,
) -> Result<(), AppError> {
    let service = open_service(config)?;
    service.write_badge(&WriteRequest {
        badge_name: Some(name.clone()),
        badge_data: Some(data),
        message: None,
        expire,
    })?;
    println!("Stored badge '{}'", name);
    Ok(())
}

/// Update the message of an existing badge.
pub fn cmd_message(config: &Config, name: String, message: String) -> Result<(), AppError> {
    let service = open_service(config)?;
    service.write_badge(&WriteRequest {
        badge_name: Some(name.clone()),
        message: Some(message),
        ..WriteRequest::default()
    })?;
    println!("Updated message of badge '{}'", name);
    Ok(())
}

// =============================================================================
// DELETE COMMAND
// =============================================================================

/// Delete a badge.
pub fn cmd_delete(config: &Config, name: &str) -> Result<(), AppError> {
    let service = open_service(config)?;
    service.delete_badge(Some(name))?;
    println!("Deleted badge '{}'", name);
    Ok(())
}
