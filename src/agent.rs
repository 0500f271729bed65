//! The turn executor: the model/tool loop for one user turn.
//!
//! [`TurnExecutor::run_turn`] drives the conversation until the model
//! answers without requesting tools, the round limit is hit, or the model
//! call fails. Tool calls are dispatched one at a time, in the order the
//! model listed them, and every call gets exactly one result message.

use std::sync::Arc;

use crate::conversation::Conversation;
use crate::message::{Message, Role};
use crate::model::ChatModel;
use crate::tools::ToolRegistry;

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model replied without tool calls; carries the flattened text.
    FinalAnswer(String),
    /// The model kept requesting tools for `rounds` consecutive rounds.
    IterationLimitReached { rounds: usize },
    /// The model invocation failed.
    Fault(String),
}

pub struct TurnExecutor {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    max_tool_rounds: usize,
}

impl TurnExecutor {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, max_tool_rounds: usize) -> Self {
        Self {
            model,
            tools,
            max_tool_rounds: max_tool_rounds.max(1),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one turn against `conversation`, appending every assistant and
    /// tool message it produces.
    ///
    /// On `Fault` or `IterationLimitReached` the conversation may end with
    /// partial work; callers decide whether to keep it.
    pub async fn run_turn(&self, conversation: &mut Conversation) -> TurnOutcome {
        let definitions = self.tools.definitions();
        let mut rounds = 0;

        loop {
            tracing::debug!(messages = conversation.len(), round = rounds, "invoking model");
            let mut reply = match self
                .model
                .invoke(conversation.messages(), &definitions)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(error = %e, "model invocation failed");
                    return TurnOutcome::Fault(e.to_string());
                }
            };
            reply.role = Role::Assistant;
            reply.tool_call_id = None;

            if !reply.has_tool_calls() {
                let text = reply.text();
                conversation.push(reply);
                tracing::info!(rounds, chars = text.len(), "turn finished");
                return TurnOutcome::FinalAnswer(text);
            }

            let calls = reply.tool_calls.clone();
            conversation.push(reply);
            if let Err(e) = conversation.validate() {
                tracing::warn!(error = %e, "rejecting malformed tool calls");
                return TurnOutcome::Fault(e.to_string());
            }
            for call in &calls {
                tracing::info!(tool = %call.name, call_id = %call.id, "dispatching tool call");
                let result = self.tools.dispatch(call).await;
                conversation.push(Message::tool_result(call.id.clone(), result.content));
            }

            rounds += 1;
            if rounds >= self.max_tool_rounds {
                tracing::warn!(rounds, "tool-loop limit reached");
                return TurnOutcome::IterationLimitReached { rounds };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use crate::model::ModelError;
    use crate::testing::{call, FailingTool, LoopingModel, PanickingTool, ScriptedModel, StubTool};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn conversation_with(user: &str) -> Conversation {
        let mut conv = Conversation::new("rules");
        conv.push(Message::user(user));
        conv
    }

    fn executor(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> TurnExecutor {
        TurnExecutor::new(model, tools, 25)
    }

    #[tokio::test]
    async fn test_immediate_answer_invokes_model_once() {
        let model = ScriptedModel::replying(vec![Message::assistant("Hi there!")]);
        let exec = executor(model.clone(), ToolRegistry::new());
        let mut conv = conversation_with("hello");

        let outcome = exec.run_turn(&mut conv).await;

        assert_eq!(outcome, TurnOutcome::FinalAnswer("Hi there!".into()));
        assert_eq!(model.invocations(), 1);
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.validate(), Ok(()));
    }

    #[tokio::test]
    async fn test_single_tool_round() {
        let model = ScriptedModel::replying(vec![
            call("c1", "X", json!({})),
            Message::assistant("All done."),
        ]);
        let stub = StubTool::new("X", "did X");
        let counter = stub.counter();
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(stub));
        let exec = executor(model.clone(), tools);
        let mut conv = conversation_with("do X");

        let outcome = exec.run_turn(&mut conv).await;

        assert_eq!(outcome, TurnOutcome::FinalAnswer("All done.".into()));
        assert_eq!(model.invocations(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        // assistant(call) + tool result + final assistant
        assert_eq!(conv.len(), 2 + 3);
        let result = &conv.messages()[3];
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(result.text(), "did X");
        assert_eq!(model.seen_lengths(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_failing_tool_feeds_error_back() {
        let model = ScriptedModel::replying(vec![
            call("c1", "fails", json!({})),
            Message::assistant("Sorry, that failed."),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(FailingTool));
        let exec = executor(model.clone(), tools);
        let mut conv = conversation_with("try it");

        let outcome = exec.run_turn(&mut conv).await;

        assert_eq!(outcome, TurnOutcome::FinalAnswer("Sorry, that failed.".into()));
        assert_eq!(model.invocations(), 2);
        assert!(conv.messages()[3].text().starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported() {
        let model = ScriptedModel::replying(vec![
            call("c1", "nonexistent_tool", json!({})),
            Message::assistant("I can't do that."),
        ]);
        let stub = StubTool::new("X", "never");
        let counter = stub.counter();
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(stub));
        let exec = executor(model.clone(), tools);
        let mut conv = conversation_with("use the thing");

        exec.run_turn(&mut conv).await;

        let result = conv.messages()[3].text();
        assert!(result.starts_with("Error:"));
        assert!(result.contains("not found"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(model.invocations(), 2);
    }

    #[tokio::test]
    async fn test_panicking_tool_does_not_end_the_turn() {
        let model = ScriptedModel::replying(vec![
            call("c1", "panics", json!({})),
            Message::assistant("Recovered."),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(PanickingTool));
        let exec = executor(model, tools);
        let mut conv = conversation_with("go");

        let outcome = exec.run_turn(&mut conv).await;

        assert_eq!(outcome, TurnOutcome::FinalAnswer("Recovered.".into()));
        assert!(conv.messages()[3].text().starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_calls_answered_in_order() {
        let model = ScriptedModel::replying(vec![
            Message::assistant_with_calls(
                "",
                vec![
                    ToolCall::new("first", "A", json!({})),
                    ToolCall::new("second", "B", json!({})),
                ],
            ),
            Message::assistant("ok"),
        ]);
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(StubTool::new("A", "from A")));
        tools.register(Box::new(StubTool::new("B", "from B")));
        let exec = executor(model, tools);
        let mut conv = conversation_with("both");

        exec.run_turn(&mut conv).await;

        let msgs = conv.messages();
        assert_eq!(msgs[3].tool_call_id.as_deref(), Some("first"));
        assert_eq!(msgs[3].text(), "from A");
        assert_eq!(msgs[4].tool_call_id.as_deref(), Some("second"));
        assert_eq!(msgs[4].text(), "from B");
        assert_eq!(conv.validate(), Ok(()));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let mut tools = ToolRegistry::new();
        let echo = StubTool::new("echo", "again");
        let counter = echo.counter();
        tools.register(Box::new(echo));
        let exec = TurnExecutor::new(Arc::new(LoopingModel), tools, 3);
        let mut conv = conversation_with("loop forever");

        let outcome = exec.run_turn(&mut conv).await;

        assert_eq!(outcome, TurnOutcome::IterationLimitReached { rounds: 3 });
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(conv.validate(), Ok(()));
    }

    #[tokio::test]
    async fn test_model_failure_is_a_fault() {
        let model = ScriptedModel::new(vec![Err(ModelError::Request("quota exceeded".into()))]);
        let exec = executor(model, ToolRegistry::new());
        let mut conv = conversation_with("hello");

        let outcome = exec.run_turn(&mut conv).await;

        match outcome {
            TurnOutcome::Fault(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("expected fault, got {:?}", other),
        }
        assert_eq!(conv.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_call_ids_are_rejected() {
        let model = ScriptedModel::replying(vec![Message::assistant_with_calls(
            "",
            vec![
                ToolCall::new("dup", "A", json!({})),
                ToolCall::new("dup", "A", json!({})),
            ],
        )]);
        let mut tools = ToolRegistry::new();
        let stub = StubTool::new("A", "from A");
        let counter = stub.counter();
        tools.register(Box::new(stub));
        let exec = executor(model, tools);
        let mut conv = conversation_with("twice");

        let outcome = exec.run_turn(&mut conv).await;

        match outcome {
            TurnOutcome::Fault(msg) => assert!(msg.contains("duplicate tool call id")),
            other => panic!("expected fault, got {:?}", other),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
