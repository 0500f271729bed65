//! Composition of the running assistant.
//!
//! The model client is built here once and shared, as `Arc<dyn ChatModel>`,
//! between the turn executor and the model-backed tools. The session then
//! runs on its own OS thread with a current-thread tokio runtime while the
//! calling thread keeps the UI.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::agent::TurnExecutor;
use crate::bridge::{channels, ControlSignal, InboundReceiver, OutboundEvent, OutboundSender};
use crate::config::Config;
use crate::model::ChatModel;
use crate::provider::{resolve_model, Provider};
use crate::session::Session;
use crate::tools::{ToolContext, ToolRegistry};

fn tool_context(config: &Config, model: Option<Arc<dyn ChatModel>>) -> ToolContext {
    ToolContext {
        model,
        shell_timeout_secs: config.shell_timeout_secs(),
        disabled: config.tools.disabled.clone(),
    }
}

/// Builds the provider, tools, executor and session for one run.
fn build_session(
    config: &Config,
    provider: Option<&str>,
    model: Option<&str>,
    outbound: OutboundSender,
) -> Result<(Session, Arc<Provider>)> {
    let selection = resolve_model(provider, model, config)?;
    let provider = Arc::new(Provider::from_config(config, &selection)?);
    let chat_model: Arc<dyn ChatModel> = provider.clone();

    let tools = ToolRegistry::with_builtins(tool_context(config, Some(Arc::clone(&chat_model))));
    let executor = TurnExecutor::new(chat_model, tools, config.max_tool_rounds());
    let session = Session::new(executor, config.system_prompt(), outbound);
    Ok((session, provider))
}

/// Runs the session on a dedicated thread until it terminates.
fn spawn_agent(session: Session, inbound: InboundReceiver) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build the agent runtime")?;
    thread::Builder::new()
        .name("perch-agent".into())
        .spawn(move || runtime.block_on(session.run(inbound)))
        .context("Failed to spawn the agent thread")
}

/// `perch chat`: the agent thread plus the TUI or the plain shell.
pub async fn chat(
    config: Config,
    provider: Option<&str>,
    model: Option<&str>,
    plain: bool,
) -> Result<()> {
    let (ui, agent) = channels();
    let (inbound, outbound) = agent.into_parts();
    let (session, provider) = build_session(&config, provider, model, outbound)?;
    tracing::info!(
        provider = %provider.kind(),
        model = provider.model(),
        plain,
        "opening chat"
    );
    let handle = spawn_agent(session, inbound)?;

    let result = if plain {
        crate::chat::run_chat(ui, config.greeting(), config.poll_interval()).await
    } else {
        crate::tui::run_tui(ui, config.greeting(), config.poll_interval()).await
    };

    // A turn in flight is never interrupted; the process exit ends it.
    if handle.is_finished() {
        if handle.join().is_err() {
            tracing::error!("agent thread panicked");
        }
    } else {
        tracing::info!("leaving with a turn still running");
    }
    result
}

/// `perch ask`: one turn through a session, printed to stdout.
pub async fn ask(
    config: Config,
    prompt: &str,
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    let (mut ui, agent) = channels();
    let (inbound, outbound) = agent.into_parts();
    let (session, provider) = build_session(&config, provider, model, outbound)?;

    println!(
        "{} [model: {}]",
        "perch".bold().cyan(),
        provider.model().yellow(),
    );
    println!();

    ui.send(ControlSignal::Continue(prompt.to_string()));
    ui.send(ControlSignal::Exit);
    session.run(inbound).await;

    for event in ui.drain().events {
        if let OutboundEvent::Message { sender, text } = event {
            println!(
                "{} {}",
                sender.label().bold(),
                crate::format::render_plain(&text)
            );
            println!();
        }
    }
    Ok(())
}

/// `perch tools`: names and descriptions of the registered tools.
///
/// The model-backed tools are listed only when a provider can be built.
pub fn list_tools(config: &Config) {
    let model: Option<Arc<dyn ChatModel>> = resolve_model(None, None, config)
        .and_then(|selection| Provider::from_config(config, &selection))
        .map(|provider| Arc::new(provider) as Arc<dyn ChatModel>)
        .ok();
    let registry = ToolRegistry::with_builtins(tool_context(config, model));

    for def in registry.definitions() {
        println!("{}", def.name.bold());
        println!("  {}", def.description.dimmed());
    }
    println!();
    println!("{} tools", registry.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Sender;
    use crate::testing::ScriptedModel;
    use crate::message::Message;

    #[test]
    fn test_disabled_tools_come_from_config() {
        let mut config = Config::default();
        config.tools.disabled = vec!["execute_shell_command".into()];
        let registry = ToolRegistry::with_builtins(tool_context(&config, None));
        assert!(registry.resolve("execute_shell_command").is_none());
        assert!(registry.resolve("current_time").is_some());
    }

    #[test]
    fn test_agent_thread_serves_signals() {
        let (mut ui, agent) = channels();
        let (inbound, outbound) = agent.into_parts();
        let model = ScriptedModel::replying(vec![Message::assistant("hi there")]);
        let executor = TurnExecutor::new(model, ToolRegistry::new(), 5);
        let session = Session::new(executor, "rules", outbound);

        let handle = spawn_agent(session, inbound).unwrap();
        ui.send(ControlSignal::Continue("hello".into()));
        ui.send(ControlSignal::Exit);
        handle.join().unwrap();

        let drained = ui.drain();
        assert!(drained.agent_gone);
        assert_eq!(
            drained.events,
            vec![
                OutboundEvent::Message {
                    sender: Sender::User,
                    text: "hello".into()
                },
                OutboundEvent::Message {
                    sender: Sender::Assistant,
                    text: "hi there".into()
                },
            ]
        );
    }
}
