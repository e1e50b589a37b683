//! Support Assistant CLI
//!
//! Answers customer-support questions for a money-transfer service.
//!
//! # Usage
//!
//! ```bash
//! support-assist ask "Quels sont vos frais ?" [--user ID] [--json]
//! support-assist chat [--user ID]
//! support-assist kb check
//! support-assist kb search "frais" [-k 5]
//! support-assist classify "je veux parler à un humain"
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/support-assist/config.toml)
//! 3. File given with --config
//! 4. Environment variables (ASSIST_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use assist_daemon::{
    handle_ask, handle_chat, handle_classify, handle_kb, init_logging, load_settings, Cli,
    Commands, Overrides,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        config_path: cli.config.clone(),
        log_level: cli.log_level.clone(),
        knowledge_base: cli.knowledge_base.clone(),
        offline: cli.offline,
    };
    let settings = load_settings(&overrides)?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Ask {
            question,
            user,
            json,
        } => {
            handle_ask(&settings, &question, &user, json).await?;
        }
        Commands::Chat { user } => {
            handle_chat(&settings, &user).await?;
        }
        Commands::Kb { command } => {
            handle_kb(&settings, command)?;
        }
        Commands::Classify { text } => {
            handle_classify(&text);
        }
    }

    Ok(())
}
