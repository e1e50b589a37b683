//! CLI argument parsing for support-assist.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Support Assistant
///
/// Answers customer questions from a curated knowledge base, with web
/// lookup and text generation as fallbacks.
#[derive(Parser, Debug)]
#[command(name = "support-assist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/support-assist/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override knowledge base path
    #[arg(long, global = true)]
    pub knowledge_base: Option<String>,

    /// Disable external search and generation
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one question
    Ask {
        /// Question text
        question: String,

        /// Conversation owner
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive conversation on stdin (/stats, /clear, /quit)
    Chat {
        /// Conversation owner
        #[arg(short, long, default_value = "cli")]
        user: String,
    },

    /// Knowledge base tools
    Kb {
        #[command(subcommand)]
        command: KbCommands,
    },

    /// Show how a text is classified (escalation, intent, topic)
    Classify {
        /// Text to classify
        text: String,
    },
}

/// Knowledge base subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KbCommands {
    /// Load and index the knowledge base, then print a report
    Check {
        /// Number of top weighted terms to show
        #[arg(long, default_value = "10")]
        terms: usize,
    },

    /// Search the index directly
    Search {
        /// Query text
        query: String,

        /// Maximum results
        #[arg(short = 'k', long, default_value = "3")]
        top_k: usize,

        /// Minimum score (default from config)
        #[arg(long)]
        min_score: Option<f32>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
