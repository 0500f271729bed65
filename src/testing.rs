//! Test doubles shared by the agent and session tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::{json, Value};

use crate::message::{Message, ToolCall};
use crate::model::{ChatModel, ModelError};
use crate::tools::{Tool, ToolDefinition, ToolResult};

/// A model that replays a fixed script of replies.
///
/// Records how many times it was invoked and the log length it saw on each
/// call. Running past the end of the script is reported as a request error.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<Message, ModelError>>>,
    invocations: AtomicUsize,
    seen_lengths: Mutex<Vec<usize>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<Message, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            invocations: AtomicUsize::new(0),
            seen_lengths: Mutex::new(Vec::new()),
        })
    }

    /// Script made only of successful replies.
    pub fn replying(replies: Vec<Message>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn seen_lengths(&self) -> Vec<usize> {
        self.seen_lengths.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Message, ModelError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.seen_lengths.lock().unwrap().push(messages.len());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Request("script exhausted".into())))
    }
}

/// A model that asks for the same tool forever.
pub struct LoopingModel;

#[async_trait::async_trait]
impl ChatModel for LoopingModel {
    async fn invoke(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Message, ModelError> {
        let id = format!("call_{}", messages.len());
        Ok(Message::assistant_with_calls(
            "",
            vec![ToolCall::new(id, "echo", json!({"text": "again"}))],
        ))
    }
}

/// Assistant message requesting a single call.
pub fn call(id: &str, name: &str, arguments: Value) -> Message {
    Message::assistant_with_calls("", vec![ToolCall::new(id, name, arguments)])
}

/// A tool that returns a fixed reply and counts its invocations.
pub struct StubTool {
    name: String,
    reply: String,
    calls: Arc<AtomicUsize>,
}

impl StubTool {
    pub fn new(name: &str, reply: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: reply.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter that keeps working after the tool is boxed.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Test stub returning a fixed reply."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolResult::success(self.reply.clone()))
    }
}

/// A tool whose handler always fails.
pub struct FailingTool;

#[async_trait::async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "fails"
    }

    fn description(&self) -> &str {
        "Test stub that always errors."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        anyhow::bail!("disk on fire")
    }
}

/// A tool whose handler panics.
pub struct PanickingTool;

#[async_trait::async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "panics"
    }

    fn description(&self) -> &str {
        "Test stub that panics."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        panic!("handler exploded")
    }
}
