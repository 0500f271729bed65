//! The append-only message log of one chat session.
//!
//! A [`Conversation`] always starts with exactly one system message. It only
//! grows by appending; the single exception is [`Conversation::reset`],
//! which drops everything but the system message.

use std::collections::HashSet;

use thiserror::Error;

use crate::message::{Message, Role};

/// Violations of the tool-call pairing rules of a conversation log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("conversation must start with exactly one system message")]
    MissingSystem,
    #[error("message {index}: system message after the head of the log")]
    StraySystem { index: usize },
    #[error("message {index}: tool result without a preceding tool call")]
    OrphanToolResult { index: usize },
    #[error("message {index}: tool result answers '{found}', expected '{expected}'")]
    MismatchedToolResult {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("message {index}: {role} message while tool calls are still pending")]
    PendingToolCalls { index: usize, role: Role },
    #[error("message {index}: duplicate tool call id '{id}'")]
    DuplicateCallId { index: usize, id: String },
}

/// Ordered message log owned by a session.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Starts a log holding only the system instructions.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drops every message except the leading system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Checks the log against the tool-call pairing rules.
    ///
    /// Tool results must answer the calls of the nearest preceding assistant
    /// message one by one, in call order, and nothing else may appear until
    /// every call is answered. A log may end with calls still pending.
    pub fn validate(&self) -> Result<(), ConversationError> {
        match self.messages.first() {
            Some(first) if first.role == Role::System => {}
            _ => return Err(ConversationError::MissingSystem),
        }

        let mut pending: Vec<&str> = Vec::new();
        for (index, msg) in self.messages.iter().enumerate().skip(1) {
            match msg.role {
                Role::Tool => {
                    let found = msg.tool_call_id.as_deref().unwrap_or_default();
                    if pending.is_empty() {
                        return Err(ConversationError::OrphanToolResult { index });
                    }
                    let expected = pending.remove(0);
                    if expected != found {
                        return Err(ConversationError::MismatchedToolResult {
                            index,
                            expected: expected.to_string(),
                            found: found.to_string(),
                        });
                    }
                }
                role => {
                    if !pending.is_empty() {
                        return Err(ConversationError::PendingToolCalls { index, role });
                    }
                    if role == Role::System {
                        return Err(ConversationError::StraySystem { index });
                    }
                    if role == Role::Assistant {
                        let mut seen = HashSet::new();
                        for call in &msg.tool_calls {
                            if !seen.insert(call.id.as_str()) {
                                return Err(ConversationError::DuplicateCallId {
                                    index,
                                    id: call.id.clone(),
                                });
                            }
                            pending.push(call.id.as_str());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use serde_json::json;

    #[test]
    fn test_reset_keeps_only_system() {
        let mut conv = Conversation::new("rules");
        conv.push(Message::user("hi"));
        conv.push(Message::assistant("hello"));
        conv.reset();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(conv.messages()[0].text(), "rules");
    }

    #[test]
    fn test_validate_accepts_paired_results() {
        let mut conv = Conversation::new("rules");
        conv.push(Message::user("do it"));
        conv.push(Message::assistant_with_calls(
            "",
            vec![
                ToolCall::new("a", "x", json!({})),
                ToolCall::new("b", "y", json!({})),
            ],
        ));
        conv.push(Message::tool_result("a", "1"));
        conv.push(Message::tool_result("b", "2"));
        conv.push(Message::assistant("done"));
        assert_eq!(conv.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_out_of_order_results() {
        let mut conv = Conversation::new("rules");
        conv.push(Message::user("do it"));
        conv.push(Message::assistant_with_calls(
            "",
            vec![
                ToolCall::new("a", "x", json!({})),
                ToolCall::new("b", "y", json!({})),
            ],
        ));
        conv.push(Message::tool_result("b", "2"));
        assert!(matches!(
            conv.validate(),
            Err(ConversationError::MismatchedToolResult { index: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_user_while_calls_pending() {
        let mut conv = Conversation::new("rules");
        conv.push(Message::user("do it"));
        conv.push(Message::assistant_with_calls(
            "",
            vec![ToolCall::new("a", "x", json!({}))],
        ));
        conv.push(Message::user("hello?"));
        assert_eq!(
            conv.validate(),
            Err(ConversationError::PendingToolCalls {
                index: 3,
                role: Role::User
            })
        );
    }

    #[test]
    fn test_validate_rejects_orphan_result() {
        let mut conv = Conversation::new("rules");
        conv.push(Message::tool_result("a", "1"));
        assert_eq!(
            conv.validate(),
            Err(ConversationError::OrphanToolResult { index: 1 })
        );
    }
}
