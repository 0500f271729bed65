//! LLM provider client and the [`ChatModel`] implementation.
//!
//! Contains the [`Provider`] struct which wraps rig-core provider clients
//! behind enum dispatch, keeping provider-specific details out of the CLI
//! layer. Supports Anthropic, OpenAI, OpenRouter, and Ollama.
//!
//! Each [`ChatModel::invoke`] is exactly one completion request: the tool
//! loop lives in the turn executor, so rig-core never runs tools itself.

use anyhow::{Context, Result};
use rig::client::CompletionClient;
use rig::completion::{CompletionModel, ToolDefinition as RigToolDefinition};
use rig::message::{
    AssistantContent, Message as RigMessage, Text, ToolCall as RigToolCall, ToolFunction,
    UserContent,
};
use rig::providers::{anthropic, openai, openrouter};
use rig::OneOrMany;

use super::kind::ProviderKind;
use super::resolve::ModelSelection;
use crate::config::Config;
use crate::message::{Content, ContentPart, Message, Role, ToolCall};
use crate::model::{ChatModel, ModelError};
use crate::tools::ToolDefinition;

/// Internal enum wrapping provider-specific clients.
enum ClientKind {
    Anthropic(anthropic::Client),
    OpenAI(openai::Client),
    OpenRouter(openrouter::Client),
    Ollama(openai::Client),
}

/// A configured LLM provider ready to handle completion requests.
///
/// Wraps a rig-core provider client, the target model name and the sampling
/// temperature. Completion models are constructed on each call since they
/// are cheap to create.
pub struct Provider {
    client: ClientKind,
    kind: ProviderKind,
    model: String,
    temperature: f64,
}

/// Dispatches an operation across provider-specific clients.
///
/// Matches on [`ClientKind`] and executes the same block for each variant,
/// letting the compiler monomorphize per provider.
macro_rules! dispatch {
    ($self:expr, |$client:ident| $body:expr) => {
        match &$self.client {
            ClientKind::Anthropic($client) => $body,
            ClientKind::OpenAI($client) => $body,
            ClientKind::OpenRouter($client) => $body,
            ClientKind::Ollama($client) => $body,
        }
    };
}

/// Builds and sends one completion request, yielding the response choice.
///
/// The request builder is generic over the provider's completion model, so
/// this has to expand inside each [`dispatch!`] arm. Each arm's raw response
/// type differs, which is why only the choice leaves the macro.
macro_rules! complete {
    ($client:expr, $model:expr, $sys:expr, $prompt:expr, $history:expr, $tools:expr, $temperature:expr) => {{
        let completion_model = $client.completion_model($model);
        let builder = completion_model
            .completion_request($prompt)
            .messages($history)
            .tools($tools)
            .max_tokens(crate::constants::MAX_TOKENS)
            .temperature($temperature);
        let builder = match $sys {
            Some(sys) => builder.preamble(sys),
            None => builder,
        };
        builder.send().await.map(|response| response.choice)
    }};
}

impl Provider {
    /// Creates a new [`Provider`] from the loaded application config.
    ///
    /// Resolves the API key through perch's config precedence chain
    /// (env var → config file → substitution) and builds the appropriate
    /// provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found for the selected provider
    /// or if client construction fails.
    pub fn from_config(config: &Config, selection: &ModelSelection) -> Result<Self> {
        let client = match selection.provider {
            ProviderKind::Anthropic => {
                let api_key = config
                    .resolve_api_key("anthropic")
                    .context("No API key found for Anthropic. Set ANTHROPIC_API_KEY or configure it in config.toml")?;
                ClientKind::Anthropic(
                    anthropic::Client::new(&api_key)
                        .context("Failed to create Anthropic client")?,
                )
            }
            ProviderKind::OpenAI => {
                let api_key = config
                    .resolve_api_key("openai")
                    .context("No API key found for OpenAI. Set OPENAI_API_KEY or configure it in config.toml")?;
                ClientKind::OpenAI(
                    openai::Client::new(&api_key).context("Failed to create OpenAI client")?,
                )
            }
            ProviderKind::OpenRouter => {
                let api_key = config
                    .resolve_api_key("openrouter")
                    .context("No API key found for OpenRouter. Set OPENROUTER_API_KEY or configure it in config.toml")?;
                ClientKind::OpenRouter(
                    openrouter::Client::new(&api_key)
                        .context("Failed to create OpenRouter client")?,
                )
            }
            ProviderKind::Ollama => {
                let base_url = config
                    .provider_entry("ollama")
                    .and_then(|o| o.base_url.as_deref())
                    .unwrap_or(crate::constants::OLLAMA_DEFAULT_BASE_URL);
                ClientKind::Ollama(
                    openai::Client::builder()
                        .api_key("ollama")
                        .base_url(format!("{}/v1", base_url))
                        .build()
                        .context("Failed to create Ollama client")?,
                )
            }
        };

        tracing::info!(provider = ?selection.provider, model = %selection.model, "provider ready");
        Ok(Self {
            client,
            kind: selection.provider,
            model: selection.model.clone(),
            temperature: config.temperature(),
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl ChatModel for Provider {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, ModelError> {
        let (preamble, prompt, history) = split_history(messages)?;
        let rig_tools: Vec<RigToolDefinition> = tools.iter().map(convert_tool_definition).collect();

        let choice = dispatch!(self, |client| {
            complete!(
                client,
                self.model.as_str(),
                preamble.clone(),
                prompt.clone(),
                history.clone(),
                rig_tools.clone(),
                self.temperature
            )
        })
        .map_err(|e| ModelError::Request(e.to_string()))?;

        convert_choice(choice)
    }
}

/// Splits perch's log into rig-core's request shape: the system message
/// becomes the preamble, the last message the prompt, everything in between
/// the chat history.
fn split_history(
    messages: &[Message],
) -> Result<(Option<String>, RigMessage, Vec<RigMessage>), ModelError> {
    let preamble = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.text());

    let mut converted: Vec<RigMessage> = messages.iter().filter_map(convert_message_to_rig).collect();
    let prompt = converted
        .pop()
        .ok_or_else(|| ModelError::Request("no messages to send".into()))?;
    Ok((preamble, prompt, converted))
}

fn convert_tool_definition(def: &ToolDefinition) -> RigToolDefinition {
    RigToolDefinition {
        name: def.name.clone(),
        description: def.description.clone(),
        parameters: def.parameters.clone(),
    }
}

/// Folds a rig-core completion choice into one assistant [`Message`].
///
/// Text items are concatenated in order; tool calls keep their order.
/// Reasoning and other items are dropped.
fn convert_choice(choice: OneOrMany<AssistantContent>) -> Result<Message, ModelError> {
    let mut text = String::new();
    let mut calls = Vec::new();
    let mut saw_content = false;

    for item in choice.into_iter() {
        match item {
            AssistantContent::Text(Text { text: part }) => {
                saw_content = true;
                text.push_str(&part);
            }
            AssistantContent::ToolCall(call) => {
                saw_content = true;
                calls.push(ToolCall::new(
                    call.id,
                    call.function.name,
                    call.function.arguments,
                ));
            }
            _ => {}
        }
    }

    if !saw_content {
        return Err(ModelError::EmptyResponse);
    }
    Ok(Message::assistant_with_calls(text, calls))
}

/// Converts a perch [`Message`] to a rig-core [`RigMessage`].
///
/// Handles all message roles:
/// - **User** → `RigMessage::User` with text content, or text and image
///   items when the message carries typed parts
/// - **Assistant** (text only) → `RigMessage::Assistant` with text content
/// - **Assistant** (with tool calls) → `RigMessage::Assistant` with `ToolCall` content items
/// - **Tool** (result) → `RigMessage::User` with `ToolResult` content
/// - **System** → `None` (system messages are extracted as preamble separately)
fn convert_message_to_rig(msg: &Message) -> Option<RigMessage> {
    match msg.role {
        Role::User => match &msg.content {
            Content::Text(text) => Some(RigMessage::user(text.clone())),
            Content::Parts(parts) => Some(RigMessage::User {
                content: convert_user_parts(parts),
            }),
        },
        Role::Assistant => {
            if msg.tool_calls.is_empty() {
                Some(RigMessage::assistant(msg.text()))
            } else {
                let mut items: Vec<AssistantContent> = Vec::new();
                let text = msg.text();
                if !text.is_empty() {
                    items.push(AssistantContent::Text(Text { text }));
                }
                for tc in &msg.tool_calls {
                    items.push(AssistantContent::ToolCall(RigToolCall::new(
                        tc.id.clone(),
                        ToolFunction::new(tc.name.clone(), tc.arguments.clone()),
                    )));
                }
                Some(RigMessage::Assistant {
                    id: None,
                    content: OneOrMany::many(items)
                        .unwrap_or_else(|_| OneOrMany::one(AssistantContent::text(""))),
                })
            }
        }
        Role::Tool => {
            let tool_call_id = msg.tool_call_id.clone().unwrap_or_else(|| {
                tracing::warn!("tool message missing tool_call_id");
                String::new()
            });
            Some(RigMessage::tool_result(tool_call_id, msg.text()))
        }
        Role::System => None,
    }
}

fn convert_user_parts(parts: &[ContentPart]) -> OneOrMany<UserContent> {
    let items: Vec<UserContent> = parts
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => UserContent::text(text.clone()),
            ContentPart::Image { url } => UserContent::image_url(url.clone(), None, None),
        })
        .collect();
    OneOrMany::many(items).unwrap_or_else(|_| OneOrMany::one(UserContent::text("")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_history_shapes_request() {
        let messages = vec![
            Message::system("rules"),
            Message::user("list files"),
            Message::assistant_with_calls("", vec![ToolCall::new("c1", "find_files", json!({}))]),
            Message::tool_result("c1", "Found files:\na.txt"),
        ];
        let (preamble, prompt, history) = split_history(&messages).unwrap();
        assert_eq!(preamble.as_deref(), Some("rules"));
        assert_eq!(history.len(), 2);
        assert!(matches!(prompt, RigMessage::User { .. }));
        assert!(matches!(history[1], RigMessage::Assistant { .. }));
    }

    #[test]
    fn test_split_history_rejects_system_only() {
        assert!(split_history(&[Message::system("rules")]).is_err());
    }

    #[test]
    fn test_convert_choice_collects_text_and_calls() {
        let choice = OneOrMany::many(vec![
            AssistantContent::text("Let me "),
            AssistantContent::text("check."),
            AssistantContent::ToolCall(RigToolCall::new(
                "c7".to_string(),
                ToolFunction::new("current_time".to_string(), json!({})),
            )),
        ])
        .unwrap();
        let msg = convert_choice(choice).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "Let me check.");
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].id, "c7");
        assert_eq!(msg.tool_calls[0].name, "current_time");
    }

    #[test]
    fn test_user_images_reach_the_request() {
        let msg = Message {
            content: Content::Parts(vec![
                ContentPart::Text {
                    text: "what is in this picture?".into(),
                },
                ContentPart::Image {
                    url: "https://example.com/cat.png".into(),
                },
            ]),
            ..Message::user("")
        };
        let Some(RigMessage::User { content }) = convert_message_to_rig(&msg) else {
            panic!("expected a user message");
        };
        let items: Vec<UserContent> = content.into_iter().collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], UserContent::Text(t) if t.text == "what is in this picture?"));
        assert!(matches!(&items[1], UserContent::Image(_)));
    }

    #[tokio::test]
    async fn test_invoke_reports_unreachable_provider() {
        let mut config = Config::default();
        let mut ollama = config.provider.ollama.take().unwrap_or_default();
        ollama.base_url = Some("http://127.0.0.1:9".into());
        config.provider.ollama = Some(ollama);
        let selection = ModelSelection {
            provider: ProviderKind::Ollama,
            model: "llama3.2".into(),
        };
        let provider = Provider::from_config(&config, &selection).unwrap();

        let result = provider
            .invoke(&[Message::system("rules"), Message::user("hello")], &[])
            .await;
        assert!(matches!(result, Err(ModelError::Request(_))));

        let result = provider.invoke(&[Message::system("rules")], &[]).await;
        assert!(matches!(result, Err(ModelError::Request(_))));
    }
}
