//! Readable-text extraction from web pages.

use anyhow::{anyhow, Context, Result};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{parse_args, Tool, ToolResult};

use crate::constants::{WEB_SCRAPER_MAX_CHARS, WEB_SCRAPER_TIMEOUT_SECS, WEB_SCRAPER_USER_AGENT};

/// Elements that carry the readable body of articles and documentation.
const CONTENT_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, code";

#[derive(Deserialize)]
struct ScrapeInput {
    link: String,
}

pub struct WebScraperTool {
    timeout: Duration,
}

impl WebScraperTool {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(WEB_SCRAPER_TIMEOUT_SECS),
        }
    }
}

impl Default for WebScraperTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the text of paragraphs, headings and code blocks in document
/// order, one block per element separated by blank lines.
pub fn extract_readable_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(CONTENT_SELECTOR)
        .map_err(|e| anyhow!("invalid content selector: {}", e))?;

    let blocks: Vec<String> = document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect();
    Ok(blocks.join("\n\n"))
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}\n... truncated at {} characters", &text[..end], max),
        None => text,
    }
}

#[async_trait::async_trait]
impl Tool for WebScraperTool {
    fn name(&self) -> &str {
        "web_scraper"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its readable text: paragraphs, headings and code blocks. Works best on articles, documentation and blog posts."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "link": {
                    "type": "string",
                    "description": "URL of the page to scrape"
                }
            },
            "required": ["link"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: ScrapeInput = parse_args(self.name(), input)?;

        let client = reqwest::Client::builder()
            .user_agent(WEB_SCRAPER_USER_AGENT)
            .timeout(self.timeout)
            .build()
            .context("failed to build HTTP client")?;

        let response = client
            .get(&input.link)
            .send()
            .await
            .with_context(|| format!("failed to fetch {}", input.link))?
            .error_for_status()
            .with_context(|| format!("error scraping {}", input.link))?;
        let html = response
            .text()
            .await
            .with_context(|| format!("failed to read body of {}", input.link))?;

        let text = extract_readable_text(&html)?;
        if text.is_empty() {
            return Ok(ToolResult::success(format!(
                "No readable text found at {}.",
                input.link
            )));
        }
        Ok(ToolResult::success(truncate_chars(text, WEB_SCRAPER_MAX_CHARS)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keeps_document_order() {
        let html = r#"<html><head><title>skip</title><script>var x = 1;</script></head>
            <body><h1>Title</h1><div>loose text</div><p>First   paragraph
            here.</p><h2>Section</h2><p></p><code>fn main() {}</code></body></html>"#;
        let text = extract_readable_text(html).unwrap();
        assert_eq!(
            text,
            "Title\n\nFirst paragraph here.\n\nSection\n\nfn main() {}"
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc".into(), 5), "abc");
        assert!(truncate_chars("abcdef".into(), 3).starts_with("abc\n..."));
    }
}
