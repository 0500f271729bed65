//! The language-model seam of the agent.
//!
//! [`ChatModel`] is everything the orchestration core knows about the LLM:
//! given the full message log and the available tool definitions it returns
//! one assistant message, which may request tool calls. The rig-core backed
//! [`Provider`](crate::provider::Provider) implements it for real providers;
//! tests drive the core with scripted implementations.

use thiserror::Error;

use crate::message::Message;
use crate::tools::ToolDefinition;

/// Failures raised while invoking the model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network, authentication, quota, or provider-side failure.
    #[error("model request failed: {0}")]
    Request(String),
    /// The provider answered without any usable content.
    #[error("model returned an empty response")]
    EmptyResponse,
}

#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the whole log and returns the next assistant message.
    ///
    /// No context-window trimming happens here; callers own the log size.
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, ModelError>;

    /// One-shot completion without tools, used by model-backed tools.
    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, ModelError> {
        let messages = [Message::system(instructions), Message::user(prompt)];
        let reply = self.invoke(&messages, &[]).await?;
        Ok(reply.text())
    }
}
