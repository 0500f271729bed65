//! Tools that call back into the language model.
//!
//! These share the session's [`ChatModel`] handle, injected when the
//! registry is built, and make one-shot completions without tools.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::retrieval::{chunk_text, rank_chunks};
use super::{parse_args, Tool, ToolResult};

use crate::constants::{
    ASK_DOCUMENT_SYSTEM_PROMPT, CHUNK_OVERLAP, CHUNK_SIZE, RETRIEVAL_TOP_K,
    SUMMARIZE_SYSTEM_PROMPT,
};
use crate::model::ChatModel;

// --- summarize_content ---

#[derive(Deserialize)]
struct SummarizeInput {
    content: String,
}

pub struct SummarizeTool {
    model: Arc<dyn ChatModel>,
}

impl SummarizeTool {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait::async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "summarize_content"
    }

    fn description(&self) -> &str {
        "Produce a concise summary of a long piece of text such as an article, report or file content."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Text to summarize"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: SummarizeInput = parse_args(self.name(), input)?;
        if input.content.trim().is_empty() {
            return Ok(ToolResult::error(
                "The provided content is empty and cannot be summarized.".into(),
            ));
        }

        let prompt = format!(
            "Content to summarize:\n---\n{}\n---\n\nConcise summary:",
            input.content
        );
        let summary = self.model.complete(SUMMARIZE_SYSTEM_PROMPT, &prompt).await?;
        Ok(ToolResult::success(summary))
    }
}

// --- ask_document ---

#[derive(Deserialize)]
struct AskInput {
    content: String,
    query: String,
}

pub struct AskDocumentTool {
    model: Arc<dyn ChatModel>,
}

impl AskDocumentTool {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

/// Builds the question prompt from the chunks most relevant to `query`.
pub fn document_prompt(content: &str, query: &str) -> String {
    let chunks = chunk_text(content, CHUNK_SIZE, CHUNK_OVERLAP);
    let context = rank_chunks(&chunks, query, RETRIEVAL_TOP_K).join("\n\n");
    format!("Context:\n{}\n\nQuestion: {}", context, query)
}

#[async_trait::async_trait]
impl Tool for AskDocumentTool {
    fn name(&self) -> &str {
        "ask_document"
    }

    fn description(&self) -> &str {
        "Answer a question using only the given text (the document), such as a file's content, clipboard text or an earlier tool result. Does not use outside knowledge."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The document text to search"
                },
                "query": {
                    "type": "string",
                    "description": "The question to answer from the document"
                }
            },
            "required": ["content", "query"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: AskInput = parse_args(self.name(), input)?;
        if input.content.trim().is_empty() {
            return Ok(ToolResult::error(
                "The provided content is empty. Cannot perform analysis.".into(),
            ));
        }

        let prompt = document_prompt(&input.content, &input.query);
        let answer = self
            .model
            .complete(ASK_DOCUMENT_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(ToolResult::success(answer))
    }
}
