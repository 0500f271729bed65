//! Environment variable substitution, API key resolution, and the
//! effective values of optional settings.

use std::time::Duration;

use super::types::{Config, ProviderEntry};

use crate::constants::{
    DEFAULT_GREETING, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_TEMPERATURE, SHELL_DEFAULT_TIMEOUT_SECS,
};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        if let Some(ref mut sp) = self.system_prompt {
            *sp = Self::resolve_str(sp);
        }
        if let Some(ref mut dp) = self.default_provider {
            *dp = Self::resolve_str(dp);
        }
        if let Some(ref mut greeting) = self.ui.greeting {
            *greeting = Self::resolve_str(greeting);
        }
        Self::resolve_provider_entry(&mut self.provider.openai);
        Self::resolve_provider_entry(&mut self.provider.anthropic);
        Self::resolve_provider_entry(&mut self.provider.ollama);
        Self::resolve_provider_entry(&mut self.provider.openrouter);
    }

    /// Resolves `{env:VAR}` patterns in a single provider entry's `api_key` and `base_url`.
    fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
        if let Some(ref mut e) = entry {
            if let Some(ref mut key) = e.api_key {
                *key = Self::resolve_str(key);
            }
            if let Some(ref mut url) = e.base_url {
                *url = Self::resolve_str(url);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        while let Some(start) = result.find("{env:") {
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 5..start + end];
                let value = std::env::var(var_name).unwrap_or_default();
                result = format!(
                    "{}{}{}",
                    &result[..start],
                    value,
                    &result[start + end + 1..]
                );
            } else {
                break;
            }
        }
        result
    }

    /// Resolve API key for a provider: env var first, then config value.
    ///
    /// Empty values count as unset, so an unfilled `{env:VAR}` placeholder
    /// does not shadow a missing key.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        let env_key = format!("{}_API_KEY", provider.to_uppercase());
        if let Ok(val) = std::env::var(&env_key) {
            if !val.is_empty() {
                return Some(val);
            }
        }

        self.provider_entry(provider)
            .and_then(|e| e.api_key.clone())
            .filter(|k| !k.is_empty())
    }

    /// The config entry for a provider name, if configured.
    pub fn provider_entry(&self, provider: &str) -> Option<&ProviderEntry> {
        let entry = match provider {
            "openai" => &self.provider.openai,
            "anthropic" => &self.provider.anthropic,
            "ollama" => &self.provider.ollama,
            "openrouter" => &self.provider.openrouter,
            _ => &None,
        };
        entry.as_ref()
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Get the model name from config, stripping provider prefix if present.
    /// Returns None if the model is the compile-time default (meaning user hasn't configured it).
    pub fn model_name(&self) -> Option<String> {
        let m = &self.model;
        if m == crate::constants::DEFAULT_MODEL {
            return None;
        }
        if let Some((_prov, model)) = m.split_once('/') {
            Some(model.to_string())
        } else {
            Some(m.to_string())
        }
    }

    /// Instructions for the head of every conversation.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Tool-round bound for a single turn; never below one.
    pub fn max_tool_rounds(&self) -> usize {
        self.agent
            .max_tool_rounds
            .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS)
            .max(1)
    }

    pub fn temperature(&self) -> f64 {
        self.agent.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn shell_timeout_secs(&self) -> u64 {
        self.tools
            .shell_timeout_secs
            .unwrap_or(SHELL_DEFAULT_TIMEOUT_SECS)
    }

    /// How often the UI drains agent events.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.ui
                .poll_interval_ms
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                .max(1),
        )
    }

    pub fn greeting(&self) -> &str {
        self.ui.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AgentConfig, ProviderConfig, ToolsConfig, UiConfig};

    #[test]
    fn test_resolve_str_substitutes_env() {
        std::env::set_var("PERCH_TEST_RESOLVE_VAR", "secret");
        assert_eq!(
            Config::resolve_str("key-{env:PERCH_TEST_RESOLVE_VAR}-end"),
            "key-secret-end"
        );
        assert_eq!(
            Config::resolve_str("{env:PERCH_TEST_SURELY_UNSET_VAR}"),
            ""
        );
        assert_eq!(Config::resolve_str("{env:unterminated"), "{env:unterminated");
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::default();
        assert_eq!(config.max_tool_rounds(), DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(config.shell_timeout_secs(), SHELL_DEFAULT_TIMEOUT_SECS);
        assert_eq!(
            config.poll_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
        assert_eq!(config.greeting(), DEFAULT_GREETING);
        assert_eq!(config.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert!(config.model_name().is_none());
    }

    #[test]
    fn test_zero_rounds_is_clamped() {
        let config = Config {
            agent: AgentConfig {
                max_tool_rounds: Some(0),
                temperature: None,
            },
            ..Config::default()
        };
        assert_eq!(config.max_tool_rounds(), 1);
    }

    #[test]
    fn test_default_toml_parses() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.max_tool_rounds(), DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(config.shell_timeout_secs(), SHELL_DEFAULT_TIMEOUT_SECS);
        assert!(config.tools.disabled.is_empty());
        assert!(config.provider.anthropic.is_some());
    }

    #[test]
    fn test_model_name_strips_provider_prefix() {
        let config = Config {
            model: "openrouter/google/gemini-2.5-flash".into(),
            ..Config::default()
        };
        assert_eq!(config.model_name().as_deref(), Some("google/gemini-2.5-flash"));
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let global = Config {
            provider: ProviderConfig {
                anthropic: Some(ProviderEntry {
                    api_key: Some("global-key".into()),
                    base_url: None,
                    model: Some("global-model".into()),
                }),
                ..ProviderConfig::default()
            },
            tools: ToolsConfig {
                shell_timeout_secs: Some(30),
                disabled: vec!["delete".into()],
            },
            ui: UiConfig {
                poll_interval_ms: Some(50),
                greeting: Some("hey".into()),
            },
            ..Config::default()
        };
        let project = Config {
            model: "gpt-4.1".into(),
            provider: ProviderConfig {
                anthropic: Some(ProviderEntry {
                    model: Some("project-model".into()),
                    ..ProviderEntry::default()
                }),
                ..ProviderConfig::default()
            },
            agent: AgentConfig {
                max_tool_rounds: Some(5),
                temperature: None,
            },
            ..Config::default()
        };

        let merged = Config::merge(global, project);

        assert_eq!(merged.model, "gpt-4.1");
        let anthropic = merged.provider.anthropic.unwrap();
        assert_eq!(anthropic.api_key.as_deref(), Some("global-key"));
        assert_eq!(anthropic.model.as_deref(), Some("project-model"));
        assert_eq!(merged.agent.max_tool_rounds, Some(5));
        assert_eq!(merged.tools.shell_timeout_secs, Some(30));
        assert_eq!(merged.tools.disabled, vec!["delete".to_string()]);
        assert_eq!(merged.ui.greeting.as_deref(), Some("hey"));
    }
}
