//! Provider kind enumeration and default model mapping.

use anyhow::{anyhow, Error};
use std::fmt;
use std::str::FromStr;

/// Identifies which LLM backend answers the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
    OpenRouter,
    /// Local models through Ollama's OpenAI-compatible endpoint.
    Ollama,
}

impl ProviderKind {
    /// Lowercase name used in config sections and `--provider`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
        }
    }

    /// Model used when neither the CLI nor the config names one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => crate::constants::DEFAULT_MODEL,
            Self::OpenAI => crate::constants::DEFAULT_OPENAI_MODEL,
            Self::OpenRouter => crate::constants::DEFAULT_OPENROUTER_MODEL,
            Self::Ollama => crate::constants::OLLAMA_DEFAULT_MODEL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    /// Case-insensitive; unknown names are an error listing the supported ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!(
                "Unknown provider: {other}. Supported: anthropic, openai, openrouter, ollama"
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
