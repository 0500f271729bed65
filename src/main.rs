//! Entry point for perch, a desktop assistant that answers in chat and acts
//! through local tools.
//!
//! This binary loads environment variables, starts file logging, parses CLI
//! arguments via [`cli`], and dispatches to the chosen subcommand.

mod agent;
mod bridge;
mod chat;
mod cli;
mod config;
mod constants;
mod conversation;
mod format;
mod logging;
mod message;
mod model;
mod provider;
mod session;
#[cfg(test)]
mod testing;
mod tools;
mod tui;

use anyhow::Result;

/// Runs the perch CLI.
///
/// Loads `.env` files (silently ignored if absent). A logging setup failure
/// is reported but does not stop the assistant.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    if let Err(e) = logging::init() {
        eprintln!("warning: file logging disabled: {:#}", e);
    }
    let cli = cli::parse();
    cli::run(cli).await
}
