//! Model resolution logic for perch.
//!
//! Resolves which provider and model to use based on CLI flags, config file,
//! and hardcoded defaults. Supports `provider/model` shorthand syntax.

use anyhow::Result;

use super::kind::ProviderKind;
use crate::config::Config;

use crate::constants::DEFAULT_PROVIDER;

/// Resolved provider + model pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub provider: ProviderKind,
    pub model: String,
}

/// Resolve which provider and model to use.
/// Priority: CLI flags > config.toml > defaults.
///
/// Accepts these formats:
///   --model anthropic/claude-sonnet-4-6  (provider/model shorthand, only when --provider is omitted)
///   --provider openrouter --model "org/model-name"  (slash preserved as model name)
///   --provider anthropic --model claude-sonnet-4-6
///   --provider anthropic  (uses the provider's configured or default model)
///   (nothing)  (uses config.toml, then hardcoded default)
pub fn resolve_model(
    cli_provider: Option<&str>,
    cli_model: Option<&str>,
    config: &Config,
) -> Result<ModelSelection> {
    if cli_provider.is_none() {
        if let Some(model_str) = cli_model {
            if let Some((prov, model)) = model_str.split_once('/') {
                return Ok(ModelSelection {
                    provider: prov.parse()?,
                    model: model.to_string(),
                });
            }
        }
    }

    let provider_str = cli_provider
        .or(config.provider_name())
        .unwrap_or(DEFAULT_PROVIDER);
    let provider: ProviderKind = provider_str.parse()?;

    let model = cli_model
        .map(String::from)
        .or_else(|| config.model_name())
        .or_else(|| {
            config
                .provider_entry(provider.as_str())
                .and_then(|e| e.model.clone())
        })
        .unwrap_or_else(|| provider.default_model().to_string());

    Ok(ModelSelection { provider, model })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let sel = resolve_model(None, None, &Config::default()).unwrap();
        assert_eq!(sel.provider, ProviderKind::Anthropic);
        assert_eq!(sel.model, crate::constants::DEFAULT_MODEL);
    }

    #[test]
    fn test_shorthand() {
        let sel = resolve_model(None, Some("openai/gpt-4.1-mini"), &Config::default()).unwrap();
        assert_eq!(sel.provider, ProviderKind::OpenAI);
        assert_eq!(sel.model, "gpt-4.1-mini");
    }

    #[test]
    fn test_explicit_provider_keeps_slash_in_model() {
        let sel = resolve_model(
            Some("openrouter"),
            Some("google/gemini-2.5-flash"),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(sel.provider, ProviderKind::OpenRouter);
        assert_eq!(sel.model, "google/gemini-2.5-flash");
    }

    #[test]
    fn test_provider_default_model() {
        let sel = resolve_model(Some("OLLAMA"), None, &Config::default()).unwrap();
        assert_eq!(sel.provider, ProviderKind::Ollama);
        assert_eq!(sel.model, crate::constants::OLLAMA_DEFAULT_MODEL);
    }

    #[test]
    fn test_unknown_provider() {
        assert!(resolve_model(Some("gemini-cloud"), None, &Config::default()).is_err());
    }
}
