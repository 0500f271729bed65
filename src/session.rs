//! The chat session: a state machine driven by UI control signals.
//!
//! A [`Session`] owns the conversation and the turn executor and lives on
//! the agent thread. It reads [`ControlSignal`]s from `inbound`, runs turns,
//! and reports everything the user should see as [`OutboundEvent`]s.

use crate::agent::{TurnExecutor, TurnOutcome};
use crate::bridge::{ControlSignal, InboundReceiver, OutboundEvent, OutboundSender, Sender};
use crate::conversation::Conversation;
use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, no conversation yet.
    Idle,
    AwaitingInput,
    /// A turn is running.
    Processing,
    /// Absorbing; every further signal is ignored.
    Terminated,
}

/// Whether the model's final text asks the application to close.
///
/// Plain case-insensitive substring match on "exit". The system prompt asks
/// the model to say "exit" when the user wants to quit, so this also fires
/// on replies such as "I did not exit the loop".
pub fn requests_exit(text: &str) -> bool {
    text.to_lowercase().contains("exit")
}

pub struct Session {
    executor: TurnExecutor,
    system_prompt: String,
    conversation: Option<Conversation>,
    state: SessionState,
    outbound: OutboundSender,
}

impl Session {
    pub fn new(
        executor: TurnExecutor,
        system_prompt: impl Into<String>,
        outbound: OutboundSender,
    ) -> Self {
        Self {
            executor,
            system_prompt: system_prompt.into(),
            conversation: None,
            state: SessionState::Idle,
            outbound,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Opens a conversation holding only the system message, clearing the
    /// current one if there is one.
    pub fn start(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        match self.conversation.as_mut() {
            Some(conversation) => conversation.reset(),
            None => self.conversation = Some(Conversation::new(self.system_prompt.clone())),
        }
        self.state = SessionState::AwaitingInput;
        tracing::info!(tools = self.executor.tools().len(), "session started");
    }

    /// Applies one control signal and returns the resulting state.
    pub async fn handle(&mut self, signal: ControlSignal) -> SessionState {
        if self.state == SessionState::Terminated {
            tracing::debug!(?signal, "session terminated; signal ignored");
            return self.state;
        }

        match signal {
            ControlSignal::Continue(text) => {
                if self.state == SessionState::AwaitingInput {
                    self.run_turn(text).await;
                } else {
                    tracing::warn!(state = ?self.state, "input ignored outside AwaitingInput");
                }
            }
            ControlSignal::Reset => {
                tracing::info!("conversation reset");
                self.start();
            }
            ControlSignal::Exit => {
                tracing::info!("session exit requested");
                self.state = SessionState::Terminated;
            }
        }
        self.state
    }

    async fn run_turn(&mut self, text: String) {
        let Some(committed) = self.conversation.as_ref() else {
            return;
        };

        self.outbound.message(Sender::User, text.clone());
        let mut working = committed.clone();
        working.push(Message::user(text));
        self.state = SessionState::Processing;

        match self.executor.run_turn(&mut working).await {
            TurnOutcome::FinalAnswer(answer) => {
                self.conversation = Some(working);
                self.outbound.message(Sender::Assistant, answer.clone());
                if requests_exit(&answer) {
                    tracing::info!("assistant reply requested exit");
                    self.outbound.emit(OutboundEvent::Exit);
                    self.state = SessionState::Terminated;
                    return;
                }
            }
            TurnOutcome::IterationLimitReached { rounds } => {
                self.outbound.message(
                    Sender::System,
                    format!("Turn aborted: tool-loop limit reached ({} rounds).", rounds),
                );
            }
            TurnOutcome::Fault(message) => {
                self.outbound.message(
                    Sender::System,
                    format!("Sorry, something went wrong: {}", message),
                );
            }
        }
        self.state = SessionState::AwaitingInput;
    }

    /// Starts the session and serves `inbound` until it terminates.
    ///
    /// A closed `inbound` channel means the UI is gone and ends the session.
    pub async fn run(mut self, mut inbound: InboundReceiver) {
        self.start();
        while self.state != SessionState::Terminated {
            match inbound.recv().await {
                Some(signal) => {
                    self.handle(signal).await;
                }
                None => {
                    tracing::info!("ui disconnected; ending session");
                    self.state = SessionState::Terminated;
                }
            }
        }
        tracing::info!("session terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{channels, UiEndpoint};
    use crate::model::{ChatModel, ModelError};
    use crate::testing::{call, LoopingModel, ScriptedModel, StubTool};
    use crate::tools::ToolRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn session_with(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> (Session, UiEndpoint) {
        let (ui, agent) = channels();
        let (_inbound, outbound) = agent.into_parts();
        let executor = TurnExecutor::new(model, tools, 25);
        (Session::new(executor, "rules", outbound), ui)
    }

    fn msg(sender: Sender, text: &str) -> OutboundEvent {
        OutboundEvent::Message {
            sender,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn test_start_opens_system_only_conversation() {
        let model = ScriptedModel::replying(vec![]);
        let (mut session, _ui) = session_with(model, ToolRegistry::new());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.conversation().is_none());

        session.start();

        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.conversation().map(|c| c.len()), Some(1));
    }

    #[tokio::test]
    async fn test_create_file_turn_end_to_end() {
        let model = ScriptedModel::replying(vec![
            call("c1", "Create", json!({"path": "/tmp", "name": "report.txt"})),
            Message::assistant("Done, I created the file."),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(StubTool::new(
            "Create",
            "File created: /tmp/report.txt",
        )));
        let (mut session, mut ui) = session_with(model, tools);
        session.start();

        let state = session
            .handle(ControlSignal::Continue(
                "create a file named report.txt in /tmp".into(),
            ))
            .await;

        assert_eq!(state, SessionState::AwaitingInput);
        assert_eq!(
            ui.drain().events,
            vec![
                msg(Sender::User, "create a file named report.txt in /tmp"),
                msg(Sender::Assistant, "Done, I created the file."),
            ]
        );
        let conv = session.conversation().unwrap();
        assert_eq!(conv.len(), 5);
        assert_eq!(conv.validate(), Ok(()));
    }

    #[tokio::test]
    async fn test_exit_in_reply_terminates() {
        let model = ScriptedModel::replying(vec![Message::assistant("please exit now")]);
        let (mut session, mut ui) = session_with(model, ToolRegistry::new());
        session.start();

        let state = session.handle(ControlSignal::Continue("bye".into())).await;

        assert_eq!(state, SessionState::Terminated);
        assert_eq!(
            ui.drain().events,
            vec![
                msg(Sender::User, "bye"),
                msg(Sender::Assistant, "please exit now"),
                OutboundEvent::Exit,
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_keeps_only_system_message() {
        let model = ScriptedModel::replying(vec![Message::assistant("hello")]);
        let (mut session, _ui) = session_with(model, ToolRegistry::new());
        session.start();
        session.handle(ControlSignal::Continue("hi".into())).await;
        assert_eq!(session.conversation().map(|c| c.len()), Some(3));

        let state = session.handle(ControlSignal::Reset).await;

        assert_eq!(state, SessionState::AwaitingInput);
        let conv = session.conversation().unwrap();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].text(), "rules");
    }

    #[tokio::test]
    async fn test_exit_signal_emits_nothing_and_absorbs() {
        let model = ScriptedModel::replying(vec![Message::assistant("unused")]);
        let (mut session, mut ui) = session_with(model.clone(), ToolRegistry::new());
        session.start();

        assert_eq!(
            session.handle(ControlSignal::Exit).await,
            SessionState::Terminated
        );
        assert_eq!(
            session.handle(ControlSignal::Reset).await,
            SessionState::Terminated
        );
        assert_eq!(
            session.handle(ControlSignal::Continue("hello?".into())).await,
            SessionState::Terminated
        );

        assert!(ui.drain().events.is_empty());
        assert_eq!(model.invocations(), 0);
    }

    #[tokio::test]
    async fn test_input_before_start_is_ignored() {
        let model = ScriptedModel::replying(vec![Message::assistant("unused")]);
        let (mut session, mut ui) = session_with(model.clone(), ToolRegistry::new());

        let state = session.handle(ControlSignal::Continue("early".into())).await;

        assert_eq!(state, SessionState::Idle);
        assert!(ui.drain().events.is_empty());
        assert_eq!(model.invocations(), 0);
    }

    #[tokio::test]
    async fn test_fault_reports_and_keeps_conversation() {
        let model = ScriptedModel::new(vec![
            Err(ModelError::Request("network down".into())),
            Ok(Message::assistant("back online")),
        ]);
        let (mut session, mut ui) = session_with(model, ToolRegistry::new());
        session.start();

        let state = session.handle(ControlSignal::Continue("hi".into())).await;

        assert_eq!(state, SessionState::AwaitingInput);
        assert_eq!(session.conversation().map(|c| c.len()), Some(1));
        let events = ui.drain().events;
        assert_eq!(events.len(), 2);
        match &events[1] {
            OutboundEvent::Message {
                sender: Sender::System,
                text,
            } => assert!(text.starts_with("Sorry, something went wrong:")),
            other => panic!("unexpected event {:?}", other),
        }

        session.handle(ControlSignal::Continue("again".into())).await;
        assert_eq!(session.conversation().map(|c| c.len()), Some(3));
    }

    #[tokio::test]
    async fn test_tool_loop_limit_reports_and_keeps_conversation() {
        let (mut ui, agent) = channels();
        let (_inbound, outbound) = agent.into_parts();
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(StubTool::new("echo", "again")));
        let executor = TurnExecutor::new(Arc::new(LoopingModel), tools, 3);
        let mut session = Session::new(executor, "rules", outbound);
        session.start();

        let state = session.handle(ControlSignal::Continue("spin".into())).await;

        assert_eq!(state, SessionState::AwaitingInput);
        assert_eq!(
            ui.drain().events,
            vec![
                msg(Sender::User, "spin"),
                msg(
                    Sender::System,
                    "Turn aborted: tool-loop limit reached (3 rounds)."
                ),
            ]
        );
        assert_eq!(session.conversation().map(|c| c.len()), Some(1));
    }

    #[tokio::test]
    async fn test_run_serves_signals_in_order() {
        let model = ScriptedModel::replying(vec![
            Message::assistant("first answer"),
            Message::assistant("second answer"),
        ]);
        let (mut ui, agent) = channels();
        let (inbound, outbound) = agent.into_parts();
        let session = Session::new(TurnExecutor::new(model, ToolRegistry::new(), 25), "rules", outbound);

        ui.send(ControlSignal::Continue("one".into()));
        ui.send(ControlSignal::Reset);
        ui.send(ControlSignal::Continue("two".into()));
        ui.send(ControlSignal::Exit);
        session.run(inbound).await;

        let drained = ui.drain();
        assert_eq!(
            drained.events,
            vec![
                msg(Sender::User, "one"),
                msg(Sender::Assistant, "first answer"),
                msg(Sender::User, "two"),
                msg(Sender::Assistant, "second answer"),
            ]
        );
        assert!(drained.agent_gone);
    }

    #[tokio::test]
    async fn test_run_ends_when_ui_disconnects() {
        let model = ScriptedModel::replying(vec![]);
        let (ui, agent) = channels();
        let (inbound, outbound) = agent.into_parts();
        let session = Session::new(TurnExecutor::new(model, ToolRegistry::new(), 25), "rules", outbound);
        drop(ui);

        session.run(inbound).await;
    }

    #[test]
    fn test_requests_exit_is_case_insensitive_substring() {
        assert!(requests_exit("Goodbye! EXIT"));
        assert!(requests_exit("I did not exit the loop"));
        assert!(!requests_exit("All done."));
    }
}
