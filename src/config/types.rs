//! Struct definitions and serde defaults for perch configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for perch, deserialized from `config.toml`.
///
/// Fields use serde defaults so perch can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default model identifier (e.g. `"claude-sonnet-4-6"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g., "anthropic", "openai").
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Operating instructions placed at the head of every conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    /// Turn executor settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Built-in tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Chat surface settings.
    #[serde(default)]
    pub ui: UiConfig,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

fn default_system_prompt() -> Option<String> {
    Some(crate::constants::DEFAULT_SYSTEM_PROMPT.to_string())
}

/// Provider-specific configuration map.
///
/// Each field corresponds to a supported LLM provider. Only providers
/// the user has configured will be `Some`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub openai: Option<ProviderEntry>,
    pub anthropic: Option<ProviderEntry>,
    pub ollama: Option<ProviderEntry>,
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderEntry {
    /// API key for authentication. Can also be set via environment variables.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (proxies, self-hosted instances).
    pub base_url: Option<String>,
    /// Model identifier to use with this provider, overriding the global default.
    pub model: Option<String>,
}

/// Settings for the model/tool loop.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    /// Maximum tool rounds in one turn before it is aborted.
    pub max_tool_rounds: Option<usize>,
    /// Sampling temperature passed to the provider.
    pub temperature: Option<f64>,
}

/// Settings for the built-in tools.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Default timeout for `execute_shell_command`, in seconds.
    pub shell_timeout_secs: Option<u64>,
    /// Names of tools to leave out of the registry.
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Settings for the chat surfaces.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct UiConfig {
    /// How often the UI drains agent events, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Greeting shown when the chat opens or is reset.
    pub greeting: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: ProviderConfig::default(),
            system_prompt: default_system_prompt(),
            default_provider: None,
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            ui: UiConfig::default(),
        }
    }
}
