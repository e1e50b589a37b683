//! support-assist library exports.
//!
//! This crate provides the command-line binary for the support assistant.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (ask, chat, kb, classify)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, KbCommands};
pub use commands::{
    build_index, build_orchestrator, handle_ask, handle_chat, handle_classify, handle_kb,
    init_logging, load_settings, Overrides,
};
