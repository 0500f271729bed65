//! Plain line-mode chat shell for perch.
//!
//! Used with `perch chat --plain` where a full-screen UI is unwanted. Input
//! is read with [`rustyline`] (history, line editing); replies are picked up
//! by polling the agent's outbound channel on the configured interval.
//!
//! - `/reset` starts a fresh conversation
//! - `/exit` or **Ctrl+D** ends the session
//! - **Ctrl+C** cancels the current line

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::time::Duration;

use crate::bridge::{ControlSignal, OutboundEvent, Sender, UiEndpoint};
use crate::config::Config;
use crate::format;

/// Runs the plain shell until the user leaves or the agent stops.
pub async fn run_chat(mut ui: UiEndpoint, greeting: &str, poll: Duration) -> Result<()> {
    println!(
        "{} (/reset to start over, /exit or Ctrl+D to quit)",
        "perch chat".bold().cyan(),
    );
    println!();
    print_message(Sender::Assistant, greeting);

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(crate::constants::HISTORY_FILENAME);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        match rl.readline(&format!("{} ", ">".green().bold())) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match line.as_str() {
                    "/exit" => {
                        ui.send(ControlSignal::Exit);
                        break;
                    }
                    "/reset" => {
                        ui.send(ControlSignal::Reset);
                        println!("{}", "Conversation reset.".dimmed());
                        println!();
                        print_message(Sender::Assistant, greeting);
                        continue;
                    }
                    cmd if cmd.starts_with('/') => {
                        println!("{} Unknown command: {}", "?".yellow(), cmd);
                        continue;
                    }
                    _ => {}
                }

                if !ui.send(ControlSignal::Continue(line)) {
                    println!("{}", "The assistant has stopped.".red());
                    break;
                }
                if !wait_for_reply(&mut ui, poll).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                ui.send(ControlSignal::Exit);
                println!("goodbye.");
                break;
            }
            Err(e) => {
                ui.send(ControlSignal::Exit);
                return Err(e.into());
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);
    Ok(())
}

/// Polls until the turn's reply or notice arrives.
///
/// Returns `false` when the shell should close.
async fn wait_for_reply(ui: &mut UiEndpoint, poll: Duration) -> bool {
    loop {
        tokio::time::sleep(poll).await;
        let drained = ui.drain();
        let mut answered = false;
        for event in drained.events {
            match event {
                OutboundEvent::Message { sender, text } => {
                    // the user's own line is already on screen
                    if sender != Sender::User {
                        print_message(sender, &text);
                        answered = true;
                    }
                }
                OutboundEvent::Exit => return false,
            }
        }
        if drained.agent_gone {
            println!("{}", "The assistant has stopped.".red());
            return false;
        }
        if answered {
            // an exit may follow the reply in the same turn
            tokio::time::sleep(poll).await;
            let trailing = ui.drain();
            return !trailing.agent_gone
                && !trailing.events.iter().any(|e| *e == OutboundEvent::Exit);
        }
    }
}

fn print_message(sender: Sender, text: &str) {
    let label = match sender {
        Sender::Assistant => sender.label().blue().bold(),
        Sender::User => sender.label().green().bold(),
        Sender::System => sender.label().yellow().bold(),
    };
    println!("{} {}", label, format::render_plain(text));
    println!();
}
