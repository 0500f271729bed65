//! File loading and merging for perch configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{
    default_model, AgentConfig, Config, ProviderConfig, ProviderEntry, ToolsConfig, UiConfig,
};

impl Config {
    /// Loads the global config from `~/.config/perch/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = Self::default_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            tracing::info!(path = %path.display(), "wrote default config");
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }

        Self::load_file(&path)
    }

    pub(super) fn default_toml() -> String {
        format!(
            r#"model = "{}"

[provider]

[provider.anthropic]
api_key = "{{env:ANTHROPIC_API_KEY}}"

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[provider.ollama]
base_url = "{}"

[agent]
max_tool_rounds = {}

[tools]
shell_timeout_secs = {}
disabled = []

[ui]
poll_interval_ms = {}
"#,
            default_model(),
            crate::constants::OLLAMA_DEFAULT_BASE_URL,
            crate::constants::DEFAULT_MAX_TOOL_ROUNDS,
            crate::constants::SHELL_DEFAULT_TIMEOUT_SECS,
            crate::constants::DEFAULT_POLL_INTERVAL_MS,
        )
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Look for perch.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "found project config");
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            provider: ProviderConfig {
                openai: merge_entry(global.provider.openai, project.provider.openai),
                anthropic: merge_entry(global.provider.anthropic, project.provider.anthropic),
                ollama: merge_entry(global.provider.ollama, project.provider.ollama),
                openrouter: merge_entry(global.provider.openrouter, project.provider.openrouter),
            },
            system_prompt: project.system_prompt.or(global.system_prompt),
            default_provider: project.default_provider.or(global.default_provider),
            agent: AgentConfig {
                max_tool_rounds: project
                    .agent
                    .max_tool_rounds
                    .or(global.agent.max_tool_rounds),
                temperature: project.agent.temperature.or(global.agent.temperature),
            },
            tools: ToolsConfig {
                shell_timeout_secs: project
                    .tools
                    .shell_timeout_secs
                    .or(global.tools.shell_timeout_secs),
                disabled: if project.tools.disabled.is_empty() {
                    global.tools.disabled
                } else {
                    project.tools.disabled
                },
            },
            ui: UiConfig {
                poll_interval_ms: project.ui.poll_interval_ms.or(global.ui.poll_interval_ms),
                greeting: project.ui.greeting.or(global.ui.greeting),
            },
        }
    }
}

/// Field-by-field merge of one provider entry; project values win.
fn merge_entry(global: Option<ProviderEntry>, project: Option<ProviderEntry>) -> Option<ProviderEntry> {
    match (global, project) {
        (Some(g), Some(p)) => Some(ProviderEntry {
            api_key: p.api_key.or(g.api_key),
            base_url: p.base_url.or(g.base_url),
            model: p.model.or(g.model),
        }),
        (g, p) => p.or(g),
    }
}
