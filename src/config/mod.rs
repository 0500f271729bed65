//! Configuration types and path resolution for perch.
//!
//! Perch stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/perch/config.toml` on Linux), optionally overridden by
//! a `perch.toml` found between the working directory and the git root.
//! The log file and readline history live under the XDG cache directory.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;

use anyhow::Result;

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }

    /// The effective configuration as TOML, for `perch config show`.
    ///
    /// API keys are masked.
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        for entry in [
            &mut shown.provider.openai,
            &mut shown.provider.anthropic,
            &mut shown.provider.ollama,
            &mut shown.provider.openrouter,
        ]
        .into_iter()
        .flatten()
        {
            if let Some(key) = entry.api_key.as_mut().filter(|k| !k.is_empty()) {
                *key = "********".to_string();
            }
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}
