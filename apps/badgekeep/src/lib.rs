//! # badgekeep
//!
//! HTTP facade and CLI over a badge store. The binary in `main.rs` is a thin
//! wrapper around [`cli::execute`]; integration tests drive [`api::create_router`].

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
