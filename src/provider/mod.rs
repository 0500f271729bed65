//! LLM provider abstraction for perch.
//!
//! Wraps rig-core's provider clients behind a [`Provider`] struct with enum
//! dispatch, keeping provider-specific details out of the CLI layer. Supports
//! Anthropic, OpenAI, OpenRouter, and Ollama (local) via [`ProviderKind`].

mod client;
mod kind;
mod resolve;

pub use client::Provider;
pub use kind::ProviderKind;
pub use resolve::{resolve_model, ModelSelection};
