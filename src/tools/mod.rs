//! Tool registry and the built-in tool set.
//!
//! Every tool implements [`Tool`]: a name, a description, a JSON schema for
//! its parameters, and an async handler that deserializes its arguments into
//! a typed input struct. [`ToolRegistry::dispatch`] is the only way the agent
//! runs a tool, and it never lets a failure escape: errors, bad arguments,
//! unknown names and even panics come back as `"Error: ..."` text so the
//! conversation log stays well-formed and the model can react.

pub mod archive;
pub mod clipboard;
pub mod documents;
pub mod files;
pub mod language;
pub mod office;
pub mod retrieval;
pub mod shell;
pub mod system;
pub mod web;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::ToolCall;
use crate::model::ChatModel;

/// The result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: String) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Error result; the text is prefixed with `Error: ` unless it already is.
    pub fn error(content: String) -> Self {
        let content = if content.starts_with("Error:") {
            content
        } else {
            format!("Error: {}", content)
        };
        Self {
            content,
            is_error: true,
        }
    }
}

/// Definition sent to the LLM so it knows what tools are available.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// Every tool implements this trait.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the LLM uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description for the LLM.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn schema(&self) -> Value;

    /// Execute the tool with the given JSON input.
    async fn execute(&self, input: Value) -> Result<ToolResult>;
}

/// Deserializes tool arguments into the tool's typed input struct.
///
/// Some providers deliver arguments as a JSON-encoded string rather than an
/// object; both shapes are accepted. `null` is treated as `{}` so tools whose
/// parameters are all optional can be called without arguments.
pub fn parse_args<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T> {
    let input = match input {
        Value::String(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("invalid arguments for '{}': not a JSON object", tool))?,
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(input).with_context(|| format!("invalid arguments for '{}'", tool))
}

/// Dependencies handed to the built-in tools at construction time.
#[derive(Clone)]
pub struct ToolContext {
    /// Model used by the summarize and document-question tools. Those tools
    /// are left out of the registry when no model is available.
    pub model: Option<Arc<dyn ChatModel>>,
    /// Wall-clock limit for shell commands, in seconds.
    pub shell_timeout_secs: u64,
    /// Tool names to leave out of the registry.
    pub disabled: Vec<String>,
}

/// Holds all registered tools and dispatches calls by name.
///
/// Built once at session start; there is no way to add or remove tools
/// while a session is running.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Called during startup.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(Arc::from(tool));
    }

    /// Looks up a tool by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Produce definitions for the LLM (sent in the API request).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.schema(),
            })
            .collect()
    }

    /// Runs one tool call and always returns a textual result.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.resolve(&call.name) else {
            tracing::warn!(tool = %call.name, call_id = %call.id, "unknown tool requested");
            return ToolResult::error(format!(
                "Error: unknown tool '{}'. The tool was not found; available tools: {}",
                call.name,
                self.names().join(", ")
            ));
        };

        let outcome = AssertUnwindSafe(tool.execute(call.arguments.clone()))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(Ok(result)) if result.is_error => ToolResult::error(result.content),
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ToolResult::error(format!("{:#}", e)),
            Err(_) => ToolResult::error(format!("tool '{}' crashed while running", call.name)),
        };
        tracing::info!(
            tool = %call.name,
            call_id = %call.id,
            is_error = result.is_error,
            bytes = result.content.len(),
            "tool finished"
        );
        result
    }

    /// Names of all registered tools, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// How many tools are registered.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a registry with all built-in tools.
    pub fn with_builtins(context: ToolContext) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(system::GetUsernameTool));
        registry.register(Box::new(system::SystemInfoTool));
        registry.register(Box::new(system::CurrentTimeTool));
        registry.register(Box::new(clipboard::SaveToClipboardTool));
        registry.register(Box::new(clipboard::GetClipboardTool));
        registry.register(Box::new(files::ListDirectoryTreeTool));
        registry.register(Box::new(files::FindFilesTool));
        registry.register(Box::new(files::CreateTool));
        registry.register(Box::new(files::DeleteTool));
        registry.register(Box::new(files::MoveTool));
        registry.register(Box::new(files::RenameTool));
        registry.register(Box::new(documents::WriteTool));
        registry.register(Box::new(documents::ReadTool));
        registry.register(Box::new(archive::ZipFilesTool));
        registry.register(Box::new(archive::UnzipFileTool));
        registry.register(Box::new(shell::OpenFileTool));
        registry.register(Box::new(shell::ShellTool::new(context.shell_timeout_secs)));
        registry.register(Box::new(web::WebScraperTool::new()));
        if let Some(model) = context.model {
            registry.register(Box::new(language::SummarizeTool::new(Arc::clone(&model))));
            registry.register(Box::new(language::AskDocumentTool::new(model)));
        }
        registry
            .tools
            .retain(|t| !context.disabled.iter().any(|d| d == t.name()));
        registry
    }
}
