//! The `write` and `read` tools.
//!
//! Plain-text formats are read and written as-is; Word, Excel and PDF files
//! go through [`super::office`].

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use super::office::{self, DocumentFormat};
use super::{parse_args, Tool, ToolResult};

use crate::constants::{BINARY_DETECTION_BYTES, DOCUMENT_MAX_SIZE, READ_FILE_MAX_SIZE};

fn unsupported(file_name: &str) -> ToolResult {
    ToolResult::error(format!(
        "Unsupported file type for '{}'. Supported extensions: {}",
        file_name,
        office::supported_extensions()
    ))
}

/// Runs a blocking document codec off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("document worker failed: {}", e))?
}

// --- write ---

#[derive(Deserialize)]
struct WriteInput {
    path: String,
    file_name: String,
    content: String,
}

pub struct WriteTool;

#[async_trait::async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write content to a file, replacing what was there. The directory is created if it does not exist. Supports plain-text formats (.txt, .md, .csv, .json), Word (.docx, one paragraph per line), Excel (.xlsx, lines become rows and tabs separate columns) and PDF."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory where the file is saved"
                },
                "file_name": {
                    "type": "string",
                    "description": "File name including its extension"
                },
                "content": {
                    "type": "string",
                    "description": "Text to write into the file"
                }
            },
            "required": ["path", "file_name", "content"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: WriteInput = parse_args(self.name(), input)?;
        let Some(format) = DocumentFormat::from_file_name(&input.file_name) else {
            return Ok(unsupported(&input.file_name));
        };
        // macro-enabled workbooks are read-only
        if input.file_name.to_lowercase().ends_with(".xlsm") {
            return Ok(unsupported(&input.file_name));
        }

        let dir = Path::new(&input.path);
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        let target = dir.join(&input.file_name);
        match format {
            DocumentFormat::Text => std::fs::write(&target, &input.content)
                .with_context(|| format!("failed to write {}", target.display()))?,
            DocumentFormat::Docx => office::write_docx(&target, &input.content)?,
            DocumentFormat::Xlsx => office::write_xlsx(&target, &input.content)?,
            DocumentFormat::Pdf => office::write_pdf(&target, &input.content)?,
        }

        Ok(ToolResult::success(format!(
            "Content written to: {} ({} bytes)",
            target.display(),
            input.content.len()
        )))
    }
}

// --- read ---

#[derive(Deserialize)]
struct ReadInput {
    path: String,
    file_name: String,
}

pub struct ReadTool;

#[async_trait::async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read the text content of a file. Supports plain-text formats (.txt, .md, .csv, .json, .log), Word (.docx), Excel (.xlsx, .xlsm) and PDF."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory where the file is located"
                },
                "file_name": {
                    "type": "string",
                    "description": "File name including its extension"
                }
            },
            "required": ["path", "file_name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: ReadInput = parse_args(self.name(), input)?;
        let Some(format) = DocumentFormat::from_file_name(&input.file_name) else {
            return Ok(unsupported(&input.file_name));
        };

        let target = Path::new(&input.path).join(&input.file_name);
        if !target.is_file() {
            return Ok(ToolResult::error(format!(
                "The file '{}' was not found.",
                target.display()
            )));
        }

        let limit = match format {
            DocumentFormat::Text => READ_FILE_MAX_SIZE,
            _ => DOCUMENT_MAX_SIZE,
        };
        let metadata = std::fs::metadata(&target)?;
        if metadata.len() > limit {
            return Ok(ToolResult::error(format!(
                "File too large: {} bytes (max {})",
                metadata.len(),
                limit
            )));
        }

        if format != DocumentFormat::Text {
            let text = read_document(format, target.clone()).await?;
            return Ok(non_empty(&target, text));
        }

        let content = std::fs::read(&target)
            .with_context(|| format!("failed to read {}", target.display()))?;
        let check_len = content.len().min(BINARY_DETECTION_BYTES);
        if content[..check_len].contains(&0) {
            return Ok(ToolResult::error(
                "Binary file detected. Cannot display binary content.".into(),
            ));
        }

        let text = String::from_utf8_lossy(&content).into_owned();
        Ok(non_empty(&target, text))
    }
}

async fn read_document(format: DocumentFormat, target: PathBuf) -> Result<String> {
    blocking(move || match format {
        DocumentFormat::Docx => office::read_docx(&target),
        DocumentFormat::Xlsx => office::read_xlsx(&target),
        DocumentFormat::Pdf => office::read_pdf(&target),
        DocumentFormat::Text => std::fs::read_to_string(&target)
            .with_context(|| format!("failed to read {}", target.display())),
    })
    .await
}

fn non_empty(target: &Path, text: String) -> ToolResult {
    if text.is_empty() {
        ToolResult::success(format!("The file '{}' is empty.", target.display()))
    } else {
        ToolResult::success(text)
    }
}
