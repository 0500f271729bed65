//! Command-line interface definition and dispatch for perch.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler; wiring the model, tools, session and channels
//! together lives in the [`runtime`] submodule.

mod runtime;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::config::Config;

/// Top-level CLI structure for perch.
///
/// Running `perch` without a subcommand opens the chat UI.
#[derive(Parser)]
#[command(name = "perch", about = "A desktop assistant that acts through local tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the perch CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat {
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Use a line-mode shell instead of the terminal UI
        #[arg(long)]
        plain: bool,
    },
    /// Ask a one-shot question
    Ask {
        /// The question to ask
        prompt: Vec<String>,
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// List the tools the assistant can call
    Tools,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective config
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Chat {
        provider: None,
        model: None,
        plain: false,
    });

    match command {
        Commands::Chat {
            provider,
            model,
            plain,
        } => {
            let config = Config::load()?;
            runtime::chat(config, provider.as_deref(), model.as_deref(), plain).await
        }
        Commands::Ask {
            prompt,
            provider,
            model,
        } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: perch ask \"your question here\"");
            }
            let config = Config::load()?;
            runtime::ask(config, &prompt, provider.as_deref(), model.as_deref()).await
        }
        Commands::Tools => {
            let config = Config::load()?;
            runtime::list_tools(&config);
            Ok(())
        }
        Commands::Config { action } => {
            let config = Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    println!("{}", config.to_display_toml()?);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["perch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_chat_flags() {
        let cli = Cli::try_parse_from(["perch", "chat", "--plain", "-m", "ollama/llama3.2"]).unwrap();
        match cli.command {
            Some(Commands::Chat {
                provider,
                model,
                plain,
            }) => {
                assert!(plain);
                assert_eq!(provider, None);
                assert_eq!(model.as_deref(), Some("ollama/llama3.2"));
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_ask_collects_words() {
        let cli = Cli::try_parse_from(["perch", "ask", "what", "time", "is", "it"]).unwrap();
        match cli.command {
            Some(Commands::Ask { prompt, .. }) => assert_eq!(prompt.join(" "), "what time is it"),
            _ => panic!("expected ask"),
        }
    }
}
