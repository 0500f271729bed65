//! Centralized constants for perch.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "perch";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-6";

/// Maximum tokens for LLM completions.
pub const MAX_TOKENS: u64 = 4096;

/// Default sampling temperature. Tool selection works best deterministic.
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

/// Default operating instructions placed at the head of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are perch, an AI assistant integrated into the user's operating system. Your goal is to carry out the user's requests on their machine using the tools available to you.

Working with files:
1. When the user says "here", "this folder" or "the current directory", they mean the folder they are working in right now. If you cannot determine it from the conversation, ask for it instead of guessing.
2. Never assume the user is still in the folder from a previous turn. Re-check the target path for every file operation, even when requests of the same kind follow each other.
3. Prefer absolute paths when calling filesystem tools.

General responsibilities:
- Be helpful and proactive. If a path or argument cannot be determined, tell the user and ask for clarification.
- When a tool returns an error, explain what went wrong in plain language and, if possible, try a different approach.
- Keep answers short. Use **bold** for key facts and "* " bullets for lists.
- If the user says 'exit', 'end', or 'stop', respond with a message that clearly includes the word 'exit' to terminate the application."#;

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "perch.toml";

/// Readline history filename for the plain shell.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

/// Default LLM model identifier for OpenAI.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";

/// Default LLM model identifier for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default LLM model identifier for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.1";

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "anthropic";

// --- Agent loop ---

/// Default cap on tool round-trips within one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;

// --- Logging ---

/// Log filename inside the cache directory.
pub const LOG_FILENAME: &str = "perch.log";

/// Number of rotated log files kept next to the active one.
pub const LOG_KEEP: u32 = 3;

/// Environment variable holding the log filter (falls back to `RUST_LOG`).
pub const LOG_ENV_VAR: &str = "PERCH_LOG";

/// Filter used when no environment filter is set.
pub const DEFAULT_LOG_FILTER: &str = "perch=info,warn";

// --- UI ---

/// Interval at which the UI drains the outbound channel.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Render tick interval for the TUI (~60 fps).
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Greeting shown whenever the chat surface opens.
pub const DEFAULT_GREETING: &str = "Hello! How can I assist you today?";

/// Braille spinner frames shown while a turn is in flight.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// --- Tool limits ---

/// Default wall-clock limit for the shell tool.
pub const SHELL_DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Maximum bytes of combined shell output returned to the model.
pub const SHELL_MAX_OUTPUT_SIZE: usize = 64 * 1024;

/// Environment variables removed before spawning shell commands.
pub const SHELL_STRIPPED_ENV_VARS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "OPENROUTER_API_KEY",
    "GEMINI_API_KEY",
];

/// Maximum file size (bytes) the read tool will load.
pub const READ_FILE_MAX_SIZE: u64 = 512 * 1024;

/// Maximum size of a Word, Excel or PDF file the read tool will open.
pub const DOCUMENT_MAX_SIZE: u64 = 20 * 1024 * 1024;

/// Byte threshold for binary file detection (check first N bytes for null).
pub const BINARY_DETECTION_BYTES: usize = 8192;

/// Extensions the read and write tools treat as text.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "tsv", "json", "log", "toml", "yaml", "yml"];

/// Maximum number of paths the find_files tool returns.
pub const FIND_FILES_MAX_RESULTS: usize = 500;

/// Maximum number of entries the directory tree tool prints.
pub const TREE_MAX_ENTRIES: usize = 2000;

/// Request timeout for the web scraper.
pub const WEB_SCRAPER_TIMEOUT_SECS: u64 = 10;

/// Browser-like user agent; many sites block the default reqwest one.
pub const WEB_SCRAPER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Upper bound on scraped characters handed back to the model.
pub const WEB_SCRAPER_MAX_CHARS: usize = 40_000;

// --- Document question answering ---

/// Characters per retrieval chunk.
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared between neighbouring chunks.
pub const CHUNK_OVERLAP: usize = 100;

/// Number of chunks handed to the model as context.
pub const RETRIEVAL_TOP_K: usize = 3;

/// Instructions for the summarize_content tool.
pub const SUMMARIZE_SYSTEM_PROMPT: &str = "You are an expert summarization engine. Provide a clear and concise summary of the content you are given. Focus on the main ideas, key arguments, and important conclusions. Present the summary so it is easy to read.";

/// Instructions for the ask_document tool.
pub const ASK_DOCUMENT_SYSTEM_PROMPT: &str = "Answer the question based only on the context you are given. If the context does not contain the answer, say so.";
