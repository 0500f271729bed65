//! System clipboard access through `arboard`.
//!
//! The clipboard handle is not `Send` on every platform, so each call opens
//! and drops its own handle on a blocking thread.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool, ToolResult};

#[derive(Deserialize)]
struct SaveInput {
    clipboard_content: String,
}

pub struct SaveToClipboardTool;

#[async_trait::async_trait]
impl Tool for SaveToClipboardTool {
    fn name(&self) -> &str {
        "save_to_clipboard"
    }

    fn description(&self) -> &str {
        "Copy the given text to the system clipboard."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "clipboard_content": {
                    "type": "string",
                    "description": "Text to place on the clipboard"
                }
            },
            "required": ["clipboard_content"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: SaveInput = parse_args(self.name(), input)?;
        let len = input.clipboard_content.chars().count();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
            clipboard
                .set_text(input.clipboard_content)
                .context("failed to write to the clipboard")?;
            Ok(())
        })
        .await
        .context("clipboard task failed")??;
        Ok(ToolResult::success(format!(
            "Copied {} characters to the clipboard.",
            len
        )))
    }
}

pub struct GetClipboardTool;

#[async_trait::async_trait]
impl Tool for GetClipboardTool {
    fn name(&self) -> &str {
        "get_clipboard_content"
    }

    fn description(&self) -> &str {
        "Return the text currently on the system clipboard."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        let text = tokio::task::spawn_blocking(|| -> Result<String> {
            let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
            clipboard
                .get_text()
                .context("the clipboard does not hold any text")
        })
        .await
        .context("clipboard task failed")??;
        if text.is_empty() {
            Ok(ToolResult::success("The clipboard is empty.".into()))
        } else {
            Ok(ToolResult::success(text))
        }
    }
}
